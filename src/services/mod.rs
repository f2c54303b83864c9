pub mod export_writer;
pub mod html_text;
pub mod question_normalizer;

pub use export_writer::ExportWriter;
pub use question_normalizer::normalize;
