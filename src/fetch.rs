// src/fetch.rs

use reqwest::Client;
use std::{future::Future, time::Duration};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::{Config, SheetConfig};
use crate::error::SourceFetchError;

/// Something that can hand back the CSV text of a sheet.
pub trait SheetSource: Send + Sync {
    fn fetch(
        &self,
        sheet: &SheetConfig,
    ) -> impl Future<Output = Result<String, SourceFetchError>> + Send;
}

/// Reads published Google Sheets over HTTP.
///
/// Each sheet is tried once per endpoint, `gviz/tq` first and the plain
/// `export` URL second; the first body that passes the length check wins.
#[derive(Clone)]
pub struct HttpSheetSource {
    client: Client,
    spreadsheet_id: String,
    min_body_len: usize,
}

impl HttpSheetSource {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .build()?;
        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: Client, config: &Config) -> Self {
        Self {
            client,
            spreadsheet_id: config.spreadsheet_id.clone(),
            min_body_len: config.min_body_len,
        }
    }

    /// CSV endpoints for `sheet`, in the order they are tried.
    pub fn endpoints(&self, sheet: &SheetConfig) -> Result<Vec<Url>, SourceFetchError> {
        let base = format!(
            "https://docs.google.com/spreadsheets/d/{}/",
            self.spreadsheet_id
        );
        let endpoint_err = |e: url::ParseError| SourceFetchError::Endpoint {
            sheet: sheet.name.clone(),
            reason: e.to_string(),
        };
        let base = Url::parse(&base).map_err(endpoint_err)?;

        let mut gviz = base.join("gviz/tq").map_err(endpoint_err)?;
        gviz.query_pairs_mut()
            .append_pair("tqx", "out:csv")
            .append_pair("gid", &sheet.gid);

        let mut export = base.join("export").map_err(endpoint_err)?;
        export
            .query_pairs_mut()
            .append_pair("format", "csv")
            .append_pair("gid", &sheet.gid);

        Ok(vec![gviz, export])
    }
}

async fn get_text_core(client: &Client, url: &Url) -> Result<String, SourceFetchError> {
    debug!("Fetching text from {}", url);
    let request_err = |source| SourceFetchError::Request {
        url: url.to_string(),
        source,
    };

    let resp = client.get(url.clone()).send().await.map_err(request_err)?;
    let status = resp.status();
    if !status.is_success() {
        return Err(SourceFetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    resp.text().await.map_err(request_err)
}

impl SheetSource for HttpSheetSource {
    #[instrument(level = "info", skip(self, sheet), fields(sheet = %sheet.name))]
    async fn fetch(&self, sheet: &SheetConfig) -> Result<String, SourceFetchError> {
        let mut last_err = None;

        for url in self.endpoints(sheet)? {
            match get_text_core(&self.client, &url).await {
                Ok(body) if body.len() >= self.min_body_len => {
                    debug!(%url, bytes = body.len(), "sheet downloaded");
                    return Ok(body);
                }
                Ok(body) => {
                    let err = SourceFetchError::ShortBody {
                        url: url.to_string(),
                        len: body.len(),
                        min: self.min_body_len,
                    };
                    warn!(error = %err, "endpoint rejected");
                    last_err = Some(err);
                }
                Err(err) => {
                    warn!(error = %err, "endpoint failed");
                    last_err = Some(err);
                }
            }
        }

        Err(last_err.unwrap_or_else(|| SourceFetchError::Endpoint {
            sheet: sheet.name.clone(),
            reason: "no endpoints".to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_use_gviz_then_export() {
        let config = Config::default();
        let source = HttpSheetSource::new(&config).unwrap();
        let urls = source.endpoints(&SheetConfig::technical()).unwrap();

        assert_eq!(urls.len(), 2);
        assert_eq!(
            urls[0].as_str(),
            "https://docs.google.com/spreadsheets/d/1s4beQ2-EJOwkjKwy_6jvJOtABPjD1104QyxS7kympo0/gviz/tq?tqx=out%3Acsv&gid=1426995834"
        );
        assert_eq!(
            urls[1].as_str(),
            "https://docs.google.com/spreadsheets/d/1s4beQ2-EJOwkjKwy_6jvJOtABPjD1104QyxS7kympo0/export?format=csv&gid=1426995834"
        );
    }

    #[test]
    fn high_school_sheet_uses_its_own_gid() {
        let source = HttpSheetSource::new(&Config::default()).unwrap();
        let urls = source.endpoints(&SheetConfig::high_school()).unwrap();
        assert!(urls.iter().all(|u| u.query().unwrap().ends_with("gid=0")));
    }

    #[tokio::test]
    async fn unreachable_host_is_a_request_error() {
        let client = Client::builder()
            .timeout(Duration::from_secs(2))
            .build()
            .unwrap();
        let url = Url::parse("http://127.0.0.1:9/sheet.csv").unwrap();
        let err = get_text_core(&client, &url).await.unwrap_err();
        assert!(matches!(err, SourceFetchError::Request { .. }));
    }
}
