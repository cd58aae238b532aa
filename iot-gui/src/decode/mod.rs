//! Request decoders: cookies aside, everything that turns an inbound body
//! into typed values.

pub mod csv;
pub mod form;
pub mod json;
pub mod page;

pub use self::csv::{collect_rows, csv_file, rows, FromCsvRow, NameRow, ThingIdRow, UserRow};
pub use form::{FormData, UploadedFile};
pub use json::JsonBody;
pub use page::PageQuery;
