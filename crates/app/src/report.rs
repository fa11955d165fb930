use quiz_core::model::Identity;
use services::AppServices;

pub async fn stats(
    services: &AppServices,
    identity: Option<&Identity>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let stats = services.stats();
    let local = stats.local_stats().await?;
    let remote = match identity {
        Some(identity) => Some(stats.remote_stats(&identity.player_id).await?),
        None => None,
    };

    if json {
        let body = serde_json::json!({ "local": local, "remote": remote });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    println!(
        "This device: {} games, {}% average",
        local.games_played, local.average
    );
    if let Some(remote) = remote {
        println!(
            "Online: {} games, {}/{} correct, {:.1}% average, {:.2} correct per game",
            remote.games_played,
            remote.total_correct,
            remote.total_attempted,
            remote.avg_percent,
            remote.avg_correct_per_game
        );
    }
    Ok(())
}

pub async fn leaderboard(
    services: &AppServices,
    limit: Option<u32>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let entries = services.leaderboard().top(limit).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }
    if entries.is_empty() {
        println!("No games played yet.");
        return Ok(());
    }
    for entry in &entries {
        let place = entry
            .medal
            .map_or_else(|| format!("{:>2}.", entry.rank), |m| format!("{} ", m.symbol()));
        println!(
            "{place} {:<20} {:>5.1}%  {} games",
            entry.username, entry.avg_percent, entry.games_played
        );
    }
    Ok(())
}
