mod choice;
mod ids;
mod question;

pub use choice::{Choice, NewChoice};
pub use ids::{ChoiceId, QuestionId};
pub use question::{NewQuestion, Question, QuestionUpdate};
