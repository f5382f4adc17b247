use serde_json::Value;
use tracing::warn;

use super::ResearchError;

/// Fetch public metadata for a repository and render the reply summary.
/// Best effort: any failure is logged and becomes `None`.
pub async fn fetch_repo_summary(
    client: &reqwest::Client,
    owner: &str,
    repo: &str,
) -> Option<String> {
    match fetch(client, owner, repo).await {
        Ok(json) => {
            let summary = repo_summary(&json);
            if summary.is_none() {
                warn!(owner, repo, "GitHub response missing expected fields");
            }
            summary
        }
        Err(e) => {
            warn!(owner, repo, error = %e, "GitHub lookup failed");
            None
        }
    }
}

async fn fetch(client: &reqwest::Client, owner: &str, repo: &str) -> Result<Value, ResearchError> {
    let url = format!("https://api.github.com/repos/{owner}/{repo}");
    let resp = client
        .get(&url)
        .header(reqwest::header::ACCEPT, "application/vnd.github.v3+json")
        .send()
        .await?
        .error_for_status()?;

    let ct = resp
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_ascii_lowercase();
    if !ct.starts_with("application/json") {
        warn!(content_type = %ct, "Unexpected content type from GitHub");
    }

    Ok(resp.json().await?)
}

fn repo_summary(json: &Value) -> Option<String> {
    let full_name = json.get("full_name").and_then(Value::as_str)?;
    let description = json
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or("(no description)");
    let stars = json
        .get("stargazers_count")
        .and_then(Value::as_u64)
        .unwrap_or(0);
    let forks = json.get("forks_count").and_then(Value::as_u64).unwrap_or(0);
    let html_url = json.get("html_url").and_then(Value::as_str).unwrap_or("");
    Some(format!(
        "Repository: {full_name}\nDescription: {description}\nStars: {stars}\nForks: {forks}\n{html_url}"
    ))
}
