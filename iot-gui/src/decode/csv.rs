//! Bulk-import files: headerless CSV, one entity per row.

use csv::{ReaderBuilder, StringRecord};

use super::form::{FormData, UploadedFile};
use crate::error::Error;

/// A typed row read from positional CSV columns.
pub trait FromCsvRow: Sized {
    /// Minimum number of columns a row needs.
    const COLUMNS: usize;

    fn from_record(record: &StringRecord) -> Self;
}

/// `name,identity,secret`
#[derive(Debug, Clone, PartialEq)]
pub struct UserRow {
    pub name: String,
    pub identity: String,
    pub secret: String,
}

impl FromCsvRow for UserRow {
    const COLUMNS: usize = 3;

    fn from_record(record: &StringRecord) -> Self {
        Self {
            name: record[0].to_string(),
            identity: record[1].to_string(),
            secret: record[2].to_string(),
        }
    }
}

/// `name`, for things, channels and groups.
#[derive(Debug, Clone, PartialEq)]
pub struct NameRow {
    pub name: String,
}

impl FromCsvRow for NameRow {
    const COLUMNS: usize = 1;

    fn from_record(record: &StringRecord) -> Self {
        Self {
            name: record[0].to_string(),
        }
    }
}

/// `thing_id`, for connect and disconnect files.
#[derive(Debug, Clone, PartialEq)]
pub struct ThingIdRow {
    pub thing_id: String,
}

impl FromCsvRow for ThingIdRow {
    const COLUMNS: usize = 1;

    fn from_record(record: &StringRecord) -> Self {
        Self {
            thing_id: record[0].to_string(),
        }
    }
}

/// The uploaded file in `field`, rejected unless it is named `*.csv`.
pub fn csv_file<'a>(form: &'a FormData, field: &str) -> Result<&'a UploadedFile, Error> {
    let file = form
        .file(field)
        .ok_or_else(|| Error::MalformedData(format!("missing file {field}")))?;
    if !file.file_name.ends_with(".csv") {
        return Err(Error::InvalidFile);
    }
    Ok(file)
}

/// Rows of `file`, decoded lazily in file order.
///
/// Every row must have as many fields as the first one and at least
/// `T::COLUMNS`.
pub fn rows<T: FromCsvRow>(
    file: &UploadedFile,
) -> Result<impl Iterator<Item = Result<T, Error>> + '_, Error> {
    if !file.file_name.ends_with(".csv") {
        return Err(Error::InvalidFile);
    }

    let reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(false)
        .from_reader(file.bytes.as_ref());

    Ok(reader
        .into_records()
        .enumerate()
        .map(|(i, record)| {
            let line = i + 1;
            let record = record.map_err(|e| Error::MalformedData(format!("row {line}: {e}")))?;
            if record.len() < T::COLUMNS {
                return Err(Error::MalformedData(format!(
                    "row {line}: expected {} columns, found {}",
                    T::COLUMNS,
                    record.len()
                )));
            }
            Ok(T::from_record(&record))
        }))
}

/// Every row of `file`, or the first error. Nothing is returned on failure.
pub fn collect_rows<T: FromCsvRow>(file: &UploadedFile) -> Result<Vec<T>, Error> {
    rows(file)?.collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;

    fn upload(name: &str, content: &str) -> UploadedFile {
        UploadedFile {
            field: "usersFile".into(),
            file_name: name.into(),
            bytes: Bytes::from(content.to_string()),
        }
    }

    #[test]
    fn wrong_suffix_is_rejected_before_reading() {
        let file = upload("users.txt", "not,even,read\n");
        assert!(matches!(
            collect_rows::<UserRow>(&file),
            Err(Error::InvalidFile)
        ));
    }

    #[test]
    fn rows_come_back_in_file_order() {
        let file = upload("users.csv", "a,a@x.io,pw1\nb,b@x.io,pw2\n");
        let users: Vec<UserRow> = collect_rows(&file).unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].identity, "a@x.io");
        assert_eq!(users[1].name, "b");
    }

    #[test]
    fn short_row_aborts_the_whole_decode() {
        let file = upload("users.csv", "a,a@x.io,pw\nb,b@x.io\nc,c@x.io,pw\n");
        assert!(matches!(
            collect_rows::<UserRow>(&file),
            Err(Error::MalformedData(_))
        ));
    }

    #[test]
    fn too_few_columns_is_malformed() {
        let file = upload("users.csv", "a,a@x.io\n");
        assert!(matches!(
            collect_rows::<UserRow>(&file),
            Err(Error::MalformedData(_))
        ));
    }

    #[test]
    fn streaming_yields_rows_before_the_bad_one() {
        let file = upload("users.csv", "a,a@x.io,pw\nb,b@x.io\n");
        let mut iter = rows::<UserRow>(&file).unwrap();
        assert!(iter.next().unwrap().is_ok());
        assert!(iter.next().unwrap().is_err());
    }

    #[test]
    fn missing_file_is_malformed() {
        let form = FormData::default();
        assert!(matches!(
            csv_file(&form, "thingsFile"),
            Err(Error::MalformedData(_))
        ));
    }
}
