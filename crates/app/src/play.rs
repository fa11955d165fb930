use std::io::BufRead;

use quiz_core::model::{GradeTier, Identity, Question};
use services::{AppServices, RemoteOutcome, SessionCommand, SessionEvent};
use tokio::sync::mpsc;
use tracing::warn;

/// Plays one timed round on the terminal.
pub async fn play(
    services: &AppServices,
    grade: Option<GradeTier>,
    identity: Option<Identity>,
) -> Result<(), Box<dyn std::error::Error>> {
    let players = services.players();
    let tier = match grade {
        Some(tier) => {
            players.select_grade(tier).await?;
            tier
        }
        None => players.selected_grade().await?,
    };

    if let Some(identity) = &identity {
        match players.record_login(identity).await {
            Ok(record) => println!("Signed in as {}", record.username),
            Err(err) => warn!(error = %err, "could not record sign-in; playing on"),
        }
    }

    println!(
        "{tier}: {} seconds. Answer with 1-4, q to stop.",
        services.settings().session_secs()
    );

    let (command_tx, command_rx) = mpsc::channel(16);
    let (event_tx, mut events) = mpsc::channel(64);
    spawn_stdin_reader(command_tx);

    let runner = services.session_runner(identity);
    let session = tokio::spawn(runner.run(tier, command_rx, event_tx));

    let mut current: Option<Question> = None;
    let mut asked = 0_u32;
    while let Some(event) = events.recv().await {
        match event {
            SessionEvent::Question(question) => {
                asked += 1;
                print_question(asked, &question);
                current = Some(question);
            }
            SessionEvent::Tick { time_remaining } => {
                if time_remaining % 15 == 0 || time_remaining <= 5 {
                    println!("  [{time_remaining}s left]");
                }
            }
            SessionEvent::Feedback(feedback) => {
                if feedback.correct {
                    println!("  correct ({}/{})", feedback.score, feedback.attempted);
                } else {
                    let answer = current
                        .as_ref()
                        .map_or("?", |q| q.options()[feedback.correct_index].as_str());
                    println!(
                        "  wrong, it was {answer} ({}/{})",
                        feedback.score, feedback.attempted
                    );
                }
            }
            SessionEvent::Rejected(err) => println!("  ({err})"),
            SessionEvent::Ended { time_remaining, .. } => {
                if time_remaining == 0 {
                    println!("Time's up!");
                } else {
                    println!("Stopped with {time_remaining}s left.");
                }
                show_results(services).await?;
            }
            SessionEvent::Recorded(report) => print_remote(&report.remote),
            SessionEvent::Unavailable => println!("Questions are unavailable right now."),
        }
    }

    // Surfaces an unavailable question source as an error.
    session.await??;
    Ok(())
}

/// The results view: shown as soon as the round ends, while the online
/// commit may still be in flight.
async fn show_results(services: &AppServices) -> Result<(), Box<dyn std::error::Error>> {
    let stats = services.stats();
    if let Some(last) = stats.take_last_session().await? {
        println!(
            "You scored {}/{} ({}%).",
            last.score, last.attempted, last.percentage
        );
    }
    let local = stats.local_stats().await?;
    println!(
        "Average over {} games: {}%",
        local.games_played, local.average
    );
    Ok(())
}

fn print_question(number: u32, question: &Question) {
    println!();
    println!("Q{number}. {}", question.prompt());
    for (i, option) in question.options().iter().enumerate() {
        println!("  {}) {option}", i + 1);
    }
}

fn print_remote(outcome: &RemoteOutcome) {
    match outcome {
        RemoteOutcome::Anonymous => {}
        RemoteOutcome::EmptyRun => println!("Nothing answered, leaderboard unchanged."),
        RemoteOutcome::AlreadyCommitted => println!("This round was already saved."),
        RemoteOutcome::Committed { stats } => println!(
            "Saved: {} games, {:.1}% average.",
            stats.games_played, stats.avg_percent
        ),
        RemoteOutcome::Failed { reason } => println!("Could not save online stats: {reason}"),
    }
}

/// Reads answers on a plain thread; tokio's stdin would hold up runtime
/// shutdown while blocked on a read.
fn spawn_stdin_reader(commands: mpsc::Sender<SessionCommand>) {
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            let command = match line.trim() {
                "q" | "Q" => SessionCommand::End,
                raw => match raw.parse::<usize>() {
                    Ok(n @ 1..=4) => SessionCommand::Answer(n - 1),
                    _ => {
                        println!("  type 1-4, or q to stop");
                        continue;
                    }
                },
            };
            if commands.blocking_send(command).is_err() {
                break;
            }
        }
    });
}
