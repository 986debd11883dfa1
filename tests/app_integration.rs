use std::fs;
use tracing::info;

mod test_utils {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub fn chart_response(symbol: &str, closes: &[f64]) -> String {
        let last = closes.last().copied().unwrap_or(100.0);
        let prev = closes
            .len()
            .checked_sub(2)
            .and_then(|i| closes.get(i))
            .copied()
            .unwrap_or(last);
        let series = closes
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            r#"{{
                "chart": {{
                    "result": [{{
                        "meta": {{
                            "symbol": "{symbol}",
                            "longName": "{symbol} Test Fund",
                            "instrumentType": "ETF",
                            "regularMarketPrice": {last},
                            "chartPreviousClose": {prev},
                            "regularMarketVolume": 1250000,
                            "regularMarketTime": 1700000000
                        }},
                        "indicators": {{
                            "quote": [{{
                                "close": [{series}],
                                "high": [{series}],
                                "low": [{series}]
                            }}]
                        }}
                    }}]
                }}
            }}"#
        )
    }

    pub async fn create_mock_server(charts: &[(&str, String)]) -> MockServer {
        let mock_server = MockServer::start().await;
        for (symbol, body) in charts {
            Mock::given(method("GET"))
                .and(path(format!("/v8/finance/chart/{symbol}")))
                .respond_with(ResponseTemplate::new(200).set_body_string(body.clone()))
                .mount(&mock_server)
                .await;
        }
        mock_server
    }

    pub fn write_config(file: &tempfile::NamedTempFile, base_url: &str) {
        let config_content = format!(
            r#"
providers:
  alpha_vantage:
    base_url: "{base_url}"
  polygon:
    base_url: "{base_url}"
  yahoo:
    base_url: "{base_url}"
timeout_secs: 5
"#
        );
        std::fs::write(file.path(), config_content).expect("Failed to write config file");
    }
}

#[test_log::test(tokio::test)]
async fn test_search_resolves_from_yahoo_mock() {
    let body = test_utils::chart_response("SPY", &[400.0, 410.0, 405.0, 420.0]);
    let mock_server = test_utils::create_mock_server(&[("SPY", body)]).await;

    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    test_utils::write_config(&config_file, &mock_server.uri());

    let config = etfscope::config::AppConfig::load_from_path(config_file.path()).unwrap();
    let search = etfscope::providers::build_search(&config).unwrap();

    let record = search.search("spy").await.expect("SPY should resolve");
    info!(?record, "Resolved record");

    assert_eq!(record.symbol, "SPY");
    assert_eq!(record.data_source, etfscope::core::DataSource::Yahoo);
    assert_eq!(record.current_price, Some(420.0));
    assert_eq!(record.name.as_deref(), Some("SPY Test Fund"));
    assert_eq!(
        record.performance_metric(etfscope::core::PerformanceMetric::OneYearReturn),
        Some(5.0)
    );
}

#[test_log::test(tokio::test)]
async fn test_search_falls_back_to_known_table() {
    // Nothing is mounted, so every live request gets a 404
    let mock_server = test_utils::create_mock_server(&[]).await;

    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    test_utils::write_config(&config_file, &mock_server.uri());

    let config = etfscope::config::AppConfig::load_from_path(config_file.path()).unwrap();
    let search = etfscope::providers::build_search(&config).unwrap();

    let record = search.search("VOO").await.expect("VOO is in the known table");
    assert_eq!(record.data_source, etfscope::core::DataSource::Limited);
    assert_eq!(record.issuer.as_deref(), Some("Vanguard"));
    assert!(record.description.contains("not available"));

    assert!(search.search("ZZZZ").await.is_none());
}

#[test_log::test(tokio::test)]
async fn test_full_app_flow_with_mock() {
    let mock_server = test_utils::create_mock_server(&[
        ("VTI", test_utils::chart_response("VTI", &[200.0, 202.0, 204.0])),
        ("QQQ", test_utils::chart_response("QQQ", &[350.0, 340.0, 360.0])),
    ])
    .await;

    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    test_utils::write_config(&config_file, &mock_server.uri());
    let config_path = config_file.path().to_str().unwrap();

    for command in [
        etfscope::AppCommand::Show {
            symbol: "VTI".to_string(),
            json: false,
        },
        etfscope::AppCommand::Show {
            symbol: "qqq".to_string(),
            json: true,
        },
        etfscope::AppCommand::Compare {
            first: "VTI".to_string(),
            second: "QQQ".to_string(),
            json: false,
        },
        etfscope::AppCommand::Compare {
            first: "VTI".to_string(),
            second: "QQQ".to_string(),
            json: true,
        },
        etfscope::AppCommand::Popular,
    ] {
        let result = etfscope::run_command(command, Some(config_path)).await;
        assert!(result.is_ok(), "Command failed with: {:?}", result.err());
    }
}

#[test_log::test(tokio::test)]
async fn test_unknown_symbol_is_reported() {
    let mock_server = test_utils::create_mock_server(&[]).await;
    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    test_utils::write_config(&config_file, &mock_server.uri());

    let result = etfscope::run_command(
        etfscope::AppCommand::Compare {
            first: "VTI".to_string(),
            second: "NOPE".to_string(),
            json: false,
        },
        Some(config_file.path().to_str().unwrap()),
    )
    .await;
    assert_eq!(result.unwrap_err().to_string(), "No data found for ETF: NOPE");
}

#[test_log::test(tokio::test)]
async fn test_missing_config_path_fails() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.yaml");
    let result = etfscope::run_command(
        etfscope::AppCommand::Popular,
        Some(missing.to_str().unwrap()),
    )
    .await;
    assert!(result.is_err());
    assert!(!fs::exists(&missing).unwrap());
}
