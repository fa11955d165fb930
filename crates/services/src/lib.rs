#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod leaderboard;
pub mod players;
pub mod sessions;
pub mod stats;

pub use quiz_core::Clock;

pub use app_services::AppServices;
pub use error::{AppServicesError, PlayerServiceError, SessionError, StatsError};
pub use leaderboard::{LeaderboardEntry, LeaderboardService, Medal, rank_players};
pub use players::PlayerService;
pub use sessions::{
    AnswerFeedback, QuestionFetch, QuestionSource, RetryPolicy, SeededSource, SessionCommand,
    SessionController, SessionEvent, SessionPhase, SessionRunner, TickOutcome,
};
pub use stats::{FinishReport, RemoteOutcome, StatsAggregator};
