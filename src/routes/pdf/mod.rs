mod handler;
mod model;

pub use handler::{pdf_info, pdf_quota, pdf_to_excel, reset_quota};
pub use model::{PAGES_FAILED_HEADER, PAGES_SUCCESSFUL_HEADER, PAGES_TOTAL_HEADER, PdfInfoResponse};
