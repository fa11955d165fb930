mod grade;
mod identity;
mod ids;
mod question;
mod result;
mod session;
mod settings;
mod stats;

pub use grade::GradeTier;
pub use identity::{DEFAULT_USERNAME, Identity};
pub use ids::{ParseIdError, PlayerId, RunId};
pub use question::{OPTION_COUNT, Question, QuestionError};
pub use result::{FinishedRun, LastSession, SessionResult};
pub use session::Session;
pub use settings::{QuizSettings, SettingsError};
pub use stats::{LocalStats, RemoteStats};
