use log::{error, info, warn};
use openssl::ssl::{SslConnector, SslMethod};
use postgres_openssl::MakeTlsConnector;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_postgres::tls::MakeTlsConnect;
use tokio_postgres::{Client, NoTls, Socket};
use url::Url;

pub fn create_ssl_connector(sslrootcert_path: &str) -> Result<MakeTlsConnector, String> {
    let mut builder =
        SslConnector::builder(SslMethod::tls()).map_err(|e| format!("SSL builder error: {}", e))?;

    builder
        .set_ca_file(sslrootcert_path)
        .map_err(|e| format!("Error loading CA cert: {}", e))?;

    Ok(MakeTlsConnector::new(builder.build()))
}

/// Remove `sslrootcert` from the query string, which libpq understands but
/// tokio-postgres rejects
///
/// Returns the cleaned URL and the certificate path, if one was given.
pub fn split_sslrootcert(database_url: &str) -> Result<(String, Option<String>), String> {
    let url = Url::parse(database_url).map_err(|e| format!("URL parse error: {}", e))?;

    let mut sslrootcert_path = None;
    let mut clean_params = Vec::new();
    for (key, value) in url.query_pairs() {
        if key == "sslrootcert" {
            sslrootcert_path = Some(value.to_string());
        } else {
            clean_params.push((key.into_owned(), value.into_owned()));
        }
    }

    let mut clean_url = url.clone();
    clean_url.set_query(None);
    if !clean_params.is_empty() {
        let query = clean_params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");
        clean_url.set_query(Some(&query));
    }

    Ok((clean_url.to_string(), sslrootcert_path))
}

async fn connect_with<T>(database_url: &str, tls: T) -> Result<Client, String>
where
    T: MakeTlsConnect<Socket>,
    T::Stream: Send + 'static,
{
    let (client, connection) = tokio_postgres::connect(database_url, tls)
        .await
        .map_err(|e| format!("Connection error: {}", e))?;

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            error!("Connection error: {}", e);
        }
    });

    Ok(client)
}

/// Open a client for one reading store
///
/// TLS is used when the URL carries `sslrootcert`, plaintext otherwise.
/// The connection task runs in the background for the life of the client.
pub async fn connect(database_url: &str) -> Result<Client, String> {
    let (clean_database_url, sslrootcert_path) = split_sslrootcert(database_url)?;

    match sslrootcert_path {
        Some(path) => {
            let connector = create_ssl_connector(&path)?;
            info!("Connecting to database with TLS (CA: {})", path);
            connect_with(&clean_database_url, connector).await
        }
        None => {
            info!("Connecting to database without TLS");
            connect_with(&clean_database_url, NoTls).await
        }
    }
}

/// A client whose background connection task may have ended
pub trait Liveness: Send + Sync {
    fn is_closed(&self) -> bool;
}

impl Liveness for Client {
    fn is_closed(&self) -> bool {
        Client::is_closed(self)
    }
}

/// Holds the current client of a store and replaces it once it has closed
///
/// The slot is only locked while checking or reconnecting; queries run on a
/// cloned handle.
pub struct ClientSlot<C> {
    slot: Mutex<Option<Arc<C>>>,
}

impl<C: Liveness> ClientSlot<C> {
    pub fn new(client: C) -> Self {
        Self {
            slot: Mutex::new(Some(Arc::new(client))),
        }
    }

    /// Return the open client, connecting again if the previous one closed
    ///
    /// A failed reconnect leaves the slot empty so the next call tries again.
    pub async fn get<F, Fut>(&self, reconnect: F) -> Result<Arc<C>, String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<C, String>>,
    {
        let mut slot = self.slot.lock().await;

        if let Some(client) = slot.as_ref() {
            if !client.is_closed() {
                return Ok(client.clone());
            }
            warn!("Database connection closed, reconnecting");
        }

        *slot = None;
        let client = Arc::new(reconnect().await?);
        *slot = Some(client.clone());
        info!("Database connection re-established");

        Ok(client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct FakeClient {
        generation: usize,
        closed: AtomicBool,
    }

    impl FakeClient {
        fn new(generation: usize) -> Self {
            Self {
                generation,
                closed: AtomicBool::new(false),
            }
        }
    }

    impl Liveness for FakeClient {
        fn is_closed(&self) -> bool {
            self.closed.load(Ordering::SeqCst)
        }
    }

    #[tokio::test]
    async fn test_client_slot_keeps_open_client() {
        let slot = ClientSlot::new(FakeClient::new(0));
        let attempts = AtomicUsize::new(0);

        for _ in 0..3 {
            let client = slot
                .get(|| async {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Ok(FakeClient::new(1))
                })
                .await
                .unwrap();
            assert_eq!(client.generation, 0);
        }
        assert_eq!(attempts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_client_slot_replaces_closed_client() {
        let slot = ClientSlot::new(FakeClient::new(0));

        let first = slot
            .get(|| async { Ok(FakeClient::new(1)) })
            .await
            .unwrap();
        first.closed.store(true, Ordering::SeqCst);

        let second = slot
            .get(|| async { Ok(FakeClient::new(1)) })
            .await
            .unwrap();
        assert_eq!(second.generation, 1);

        // the new client is reused while it stays open
        let third = slot
            .get(|| async { Ok(FakeClient::new(2)) })
            .await
            .unwrap();
        assert_eq!(third.generation, 1);
    }

    #[tokio::test]
    async fn test_client_slot_retries_after_failed_reconnect() {
        let slot = ClientSlot::new(FakeClient::new(0));
        slot.get(|| async { Ok(FakeClient::new(9)) })
            .await
            .unwrap()
            .closed
            .store(true, Ordering::SeqCst);

        let failed = slot
            .get(|| async { Err("Connection error: refused".to_string()) })
            .await;
        assert!(failed.is_err());

        let recovered = slot
            .get(|| async { Ok(FakeClient::new(2)) })
            .await
            .unwrap();
        assert_eq!(recovered.generation, 2);
    }

    #[test]
    fn test_split_sslrootcert_removes_param() {
        let (url, cert) = split_sslrootcert(
            "postgres://user:pw@db.local:5432/sensors?sslmode=require&sslrootcert=/etc/ca.pem",
        )
        .unwrap();
        assert_eq!(url, "postgres://user:pw@db.local:5432/sensors?sslmode=require");
        assert_eq!(cert.as_deref(), Some("/etc/ca.pem"));
    }

    #[test]
    fn test_split_sslrootcert_without_param() {
        let (url, cert) = split_sslrootcert("postgres://user@localhost/sensors").unwrap();
        assert_eq!(url, "postgres://user@localhost/sensors");
        assert!(cert.is_none());
    }

    #[test]
    fn test_split_sslrootcert_invalid_url() {
        assert!(split_sslrootcert("not a url").is_err());
    }
}
