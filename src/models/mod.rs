pub mod question;
pub mod raw;

pub use question::{CanonicalQuestion, QuestionKind};
pub use raw::{
    question_id_of, ChapterContent, ChapterEntry, CourseDirectory, Coursepage, RawAnswer,
    RawChoice, RawQuestion, Wholepage, WholepageItem,
};
