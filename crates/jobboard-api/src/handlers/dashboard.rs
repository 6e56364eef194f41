//! Role-restricted browser pages.

use axum::response::Html;

use crate::auth::CurrentUser;

pub async fn employer_dashboard(CurrentUser(user): CurrentUser) -> Html<String> {
    Html(format!(
        "<!doctype html><title>Employer dashboard</title><h1>Welcome back, {}</h1>",
        escape(&user.name)
    ))
}

pub async fn candidate_dashboard(CurrentUser(user): CurrentUser) -> Html<String> {
    Html(format!(
        "<!doctype html><title>Candidate dashboard</title><h1>Welcome back, {}</h1>",
        escape(&user.name)
    ))
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
