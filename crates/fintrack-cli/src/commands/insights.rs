//! Insight cards for a single user

use anyhow::{Context, Result};
use chrono::NaiveDate;

use fintrack_core::ai::AIClient;
use fintrack_core::db::Database;
use fintrack_core::insights::AnalysisContext;
use fintrack_core::{Insight, InsightEngine};

pub async fn cmd_insights(
    db: &Database,
    user: &str,
    today: NaiveDate,
    max_insights: usize,
    json: bool,
) -> Result<Vec<Insight>> {
    let (user, _) = db
        .get_login(user)?
        .with_context(|| format!("No user named '{}'", user))?;

    let ai = AIClient::from_env();
    if ai.is_none() && !json {
        println!("   💡 Tip: Set OLLAMA_HOST or AI_BACKEND for generated summaries");
    }

    let ctx = AnalysisContext::load(db, ai.as_ref(), user.id, today)?;
    let insights = InsightEngine::new()
        .with_max_insights(max_insights)
        .run_and_persist(&ctx)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&insights)?);
        return Ok(insights);
    }

    println!("💡 Insights for {} ({}):", user.username, today);
    for insight in &insights {
        println!();
        println!("   [{}] {}", insight.kind.as_str(), insight.title);
        println!("   {}", insight.description);
        if let Some(details) = &insight.llm_details {
            println!("   {}", details);
        }
    }

    Ok(insights)
}
