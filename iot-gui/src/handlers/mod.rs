use std::future::Future;

use crate::error::Error;

pub mod app;
pub mod auth;
pub mod channels;
pub mod groups;
pub mod messages;
pub mod metrics;
pub mod policies;
pub mod things;
pub mod users;

/// Calls `create` once per decoded row, in order, and returns how many rows
/// were created. The first decode or backend failure stops the import;
/// rows created before it stay created.
pub(crate) async fn import_rows<T, I, F, Fut, R>(rows: I, mut create: F) -> Result<usize, Error>
where
    I: IntoIterator<Item = Result<T, Error>>,
    F: FnMut(T) -> Fut,
    Fut: Future<Output = Result<R, iot_sdk::Error>>,
{
    let mut committed = 0;
    for row in rows {
        let created = match row {
            Ok(row) => create(row).await.map_err(Error::from),
            Err(e) => Err(e),
        };
        if let Err(source) = created {
            return Err(Error::BulkImport {
                committed,
                source: Box::new(source),
            });
        }
        committed += 1;
    }
    Ok(committed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    use crate::error::Outcome;

    fn conflict() -> iot_sdk::Error {
        iot_sdk::Error::Api {
            kind: iot_sdk::ErrorKind::Fetch,
            status: 409,
            message: "entity already exists".into(),
        }
    }

    #[tokio::test]
    async fn import_stops_at_first_backend_failure() {
        let rows: Vec<Result<&str, Error>> = vec![Ok("a"), Ok("b"), Ok("c")];
        let mut sent = Vec::new();

        let err = import_rows(rows, |name| {
            sent.push(name);
            let result = if name == "b" { Err(conflict()) } else { Ok(()) };
            async move { result }
        })
        .await
        .unwrap_err();

        assert_eq!(sent, vec!["a", "b"]);
        assert!(matches!(err, Error::BulkImport { committed: 1, .. }));
        assert_eq!(
            err.outcome(),
            Outcome::Status(StatusCode::SERVICE_UNAVAILABLE)
        );
    }

    #[tokio::test]
    async fn import_stops_at_first_malformed_row() {
        let rows: Vec<Result<&str, Error>> = vec![
            Ok("a"),
            Err(Error::MalformedData("row 2".into())),
            Ok("c"),
        ];
        let mut sent = Vec::new();

        let err = import_rows(rows, |name| {
            sent.push(name);
            async { Ok::<_, iot_sdk::Error>(()) }
        })
        .await
        .unwrap_err();

        assert_eq!(sent, vec!["a"]);
        assert_eq!(err.outcome(), Outcome::Status(StatusCode::BAD_REQUEST));
    }

    #[tokio::test]
    async fn import_counts_every_row() {
        let rows: Vec<Result<u8, Error>> = vec![Ok(1), Ok(2)];
        let count = import_rows(rows, |_| async { Ok::<_, iot_sdk::Error>(()) })
            .await
            .unwrap();
        assert_eq!(count, 2);
    }
}
