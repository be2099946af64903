use std::{path::PathBuf, sync::Arc};

use log::{info, warn};

use crate::{
    config::{PortalConfig, TokenExtractor},
    error::FetchError,
    fetch_context::FetchContext,
    models::{FetchResult, StudentInfo},
    requests::{HttpConnector, PortalConnector},
    result_parser::ResultPageParser,
};

/// The portal answers with this (and a normal 200) when it rejects the session.
pub const AUTHORIZATION_DENIED_PHRASE: &str = "You are not authorize";

pub struct ResultFetcher {
    connector: Arc<dyn PortalConnector>,
    token_extractor: TokenExtractor,
    parser: ResultPageParser,
    diagnostic_dump_path: PathBuf,
}

impl ResultFetcher {
    pub fn new(config: PortalConfig) -> anyhow::Result<Self> {
        let connector = Arc::new(HttpConnector::new(config.clone()));
        Self::with_connector(config, connector)
    }

    pub fn with_connector(
        config: PortalConfig,
        connector: Arc<dyn PortalConnector>,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            connector,
            token_extractor: TokenExtractor::new()?,
            parser: ResultPageParser::new(config.layout)?,
            diagnostic_dump_path: config.diagnostic_dump_path,
        })
    }

    pub async fn fetch(&self, registration_number: &str) -> Result<FetchResult, FetchError> {
        self.fetch_with_context(&FetchContext::new(registration_number))
            .await
    }

    /// Runs the login-token, result-lookup, parse sequence once.
    /// Either a full result with at least one course comes back, or an error.
    pub async fn fetch_with_context(&self, ctx: &FetchContext) -> Result<FetchResult, FetchError> {
        let session = self.connector.open_session()?;

        let login_page = session.fetch_login_page().await?;
        let Some(token) = self.token_extractor.extract(&login_page) else {
            warn!(
                "[{ctx}] no token on login page ({} bytes)",
                login_page.len()
            );
            return Err(FetchError::TokenNotFound);
        };
        info!("[{ctx}] acquired session token");

        let result_page = session
            .submit_result_lookup(token, &ctx.registration_number)
            .await?;
        if result_page.contains(AUTHORIZATION_DENIED_PHRASE) {
            warn!("[{ctx}] portal denied authorization");
            return Err(FetchError::AuthorizationDenied);
        }

        let page = self.parser.parse(&result_page)?;
        if page.courses.is_empty() {
            warn!("[{ctx}] no course rows: {}", page.diagnostics);
            self.dump_result_page(ctx, &result_page).await;
            return Err(FetchError::NoResultsFound(page.diagnostics));
        }

        info!(
            "[{ctx}] extracted {} courses (name found: {})",
            page.courses.len(),
            page.student_name.is_some()
        );
        Ok(FetchResult {
            success: true,
            student_info: StudentInfo::new(ctx.registration_number.clone(), page.student_name),
            courses: page.courses,
        })
    }

    async fn dump_result_page(&self, ctx: &FetchContext, body: &str) {
        match tokio::fs::write(&self.diagnostic_dump_path, body).await {
            Ok(()) => info!(
                "[{ctx}] wrote result page to {}",
                self.diagnostic_dump_path.display()
            ),
            Err(e) => warn!(
                "[{ctx}] couldn't write result page to {}: {e}",
                self.diagnostic_dump_path.display()
            ),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{models::UNKNOWN_STUDENT, requests::PortalSession};
    use async_trait::async_trait;
    use std::sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    pub const LOGIN_PAGE: &str = r#"<html><script>
        document.getElementById('token').value='abc123';
    </script></html>"#;

    pub fn result_page(name_row: &str, rows: usize) -> String {
        let row = "<tr><td>1</td><td> Winter 2021 </td><td>T</td><td>CS-101</td>\
                   <td>Programming Fundamentals</td><td>3(2-1)</td><td>10</td><td>8</td>\
                   <td>40</td><td>20</td><td> 78 </td><td>B</td></tr>";
        format!(
            "<html><body><table>{name_row}</table>\
             <table><tr><th>Sr</th><th>Course Code</th></tr>{}</table></body></html>",
            row.repeat(rows)
        )
    }

    #[derive(Default)]
    pub struct Calls {
        pub sessions: AtomicUsize,
        pub logins: AtomicUsize,
        pub lookups: AtomicUsize,
        pub submitted: Mutex<Vec<(String, String)>>,
    }

    pub struct StubConnector {
        pub login_page: String,
        pub result_page: String,
        pub calls: Arc<Calls>,
    }

    impl StubConnector {
        pub fn new(login_page: &str, result_page: &str) -> Self {
            Self {
                login_page: login_page.to_string(),
                result_page: result_page.to_string(),
                calls: Arc::new(Calls::default()),
            }
        }
    }

    struct StubSession {
        login_page: String,
        result_page: String,
        calls: Arc<Calls>,
    }

    impl PortalConnector for StubConnector {
        fn open_session(&self) -> Result<Box<dyn PortalSession>, FetchError> {
            self.calls.sessions.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(StubSession {
                login_page: self.login_page.clone(),
                result_page: self.result_page.clone(),
                calls: Arc::clone(&self.calls),
            }))
        }
    }

    #[async_trait]
    impl PortalSession for StubSession {
        async fn fetch_login_page(&self) -> Result<String, FetchError> {
            self.calls.logins.fetch_add(1, Ordering::SeqCst);
            Ok(self.login_page.clone())
        }

        async fn submit_result_lookup(
            &self,
            token: &str,
            registration_number: &str,
        ) -> Result<String, FetchError> {
            self.calls.lookups.fetch_add(1, Ordering::SeqCst);
            self.calls
                .submitted
                .lock()
                .unwrap()
                .push((token.to_string(), registration_number.to_string()));
            Ok(self.result_page.clone())
        }
    }

    fn fetcher_with(connector: StubConnector, dump_path: PathBuf) -> (ResultFetcher, Arc<Calls>) {
        let calls = Arc::clone(&connector.calls);
        let config = PortalConfig {
            diagnostic_dump_path: dump_path,
            ..PortalConfig::default()
        };
        let fetcher = ResultFetcher::with_connector(config, Arc::new(connector)).unwrap();
        (fetcher, calls)
    }

    #[tokio::test]
    async fn fetches_and_parses_results() {
        let dir = tempfile::tempdir().unwrap();
        let html = result_page(
            "<tr><td>Student Full Name</td><td> Ali Khan </td></tr>",
            1,
        );
        let (fetcher, calls) =
            fetcher_with(StubConnector::new(LOGIN_PAGE, &html), dir.path().join("dump.html"));

        let result = fetcher.fetch("2020-ag-1234").await.unwrap();

        assert!(result.success);
        assert_eq!(result.student_info.registration_number, "2020-ag-1234");
        assert_eq!(result.student_info.full_name, "Ali Khan");
        assert_eq!(result.courses.len(), 1);
        let course = &result.courses[0];
        assert_eq!(course.semester, "Winter 2021");
        assert_eq!(course.course_code, "CS-101");
        assert_eq!(course.course_title, "Programming Fundamentals");
        assert_eq!(course.credit_hours, "3(2-1)");
        assert_eq!(course.total, "78");
        assert_eq!(course.grade, "B");

        assert_eq!(calls.sessions.load(Ordering::SeqCst), 1);
        assert_eq!(
            *calls.submitted.lock().unwrap(),
            vec![("abc123".to_string(), "2020-ag-1234".to_string())]
        );
        assert!(!dir.path().join("dump.html").exists());
    }

    #[tokio::test]
    async fn missing_token_stops_before_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let (fetcher, calls) = fetcher_with(
            StubConnector::new("<html>maintenance</html>", &result_page("", 1)),
            dir.path().join("dump.html"),
        );

        let err = fetcher.fetch("2020-ag-1234").await.unwrap_err();

        assert!(matches!(err, FetchError::TokenNotFound));
        assert_eq!(calls.logins.load(Ordering::SeqCst), 1);
        assert_eq!(calls.lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn denial_phrase_wins_over_course_table() {
        let dir = tempfile::tempdir().unwrap();
        let html = format!("<p>You are not authorized</p>{}", result_page("", 3));
        let (fetcher, _) =
            fetcher_with(StubConnector::new(LOGIN_PAGE, &html), dir.path().join("dump.html"));

        let err = fetcher.fetch("2020-ag-1234").await.unwrap_err();

        assert!(matches!(err, FetchError::AuthorizationDenied));
    }

    #[tokio::test]
    async fn empty_table_is_not_found_and_dumps_page() {
        let dir = tempfile::tempdir().unwrap();
        let dump_path = dir.path().join("dump.html");
        std::fs::write(&dump_path, "stale").unwrap();
        let html = result_page("", 0);
        let (fetcher, _) = fetcher_with(StubConnector::new(LOGIN_PAGE, &html), dump_path.clone());

        let err = fetcher.fetch("2020-ag-1234").await.unwrap_err();

        match err {
            FetchError::NoResultsFound(diagnostics) => {
                assert_eq!(diagnostics.tables_found, 2);
                assert!(diagnostics.target_table_found);
                assert_eq!(diagnostics.target_rows, Some(1));
            }
            other => panic!("expected NoResultsFound, got {other:?}"),
        }
        assert_eq!(std::fs::read_to_string(&dump_path).unwrap(), html);
    }

    #[tokio::test]
    async fn unwritable_dump_path_still_reports_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let dump_path = dir.path().join("missing-dir").join("dump.html");
        let (fetcher, _) = fetcher_with(
            StubConnector::new(LOGIN_PAGE, "<html><body>no tables</body></html>"),
            dump_path,
        );

        let err = fetcher.fetch("2020-ag-1234").await.unwrap_err();

        assert!(matches!(err, FetchError::NoResultsFound(_)));
    }

    #[tokio::test]
    async fn missing_name_falls_back_to_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let (fetcher, _) = fetcher_with(
            StubConnector::new(LOGIN_PAGE, &result_page("", 2)),
            dir.path().join("dump.html"),
        );

        let result = fetcher.fetch("2020-ag-1234").await.unwrap();

        assert_eq!(result.student_info.full_name, UNKNOWN_STUDENT);
        assert_eq!(result.courses.len(), 2);
    }

    #[tokio::test]
    async fn every_fetch_opens_a_new_session() {
        let dir = tempfile::tempdir().unwrap();
        let (fetcher, calls) = fetcher_with(
            StubConnector::new(LOGIN_PAGE, &result_page("", 1)),
            dir.path().join("dump.html"),
        );

        fetcher.fetch("a").await.unwrap();
        fetcher.fetch("b").await.unwrap();

        assert_eq!(calls.sessions.load(Ordering::SeqCst), 2);
    }
}
