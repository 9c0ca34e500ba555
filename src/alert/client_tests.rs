//! Tests for `ReqwestClient`.

use super::*;

mod reqwest_client {
    use super::*;

    #[test]
    fn default_and_new_construct() {
        let _ = format!("{:?}", ReqwestClient::new());
        let _ = format!("{:?}", ReqwestClient::default());
    }

    #[test]
    fn with_timeout_builds_client() {
        let client = ReqwestClient::with_timeout(ReqwestClient::DEFAULT_TIMEOUT).unwrap();
        assert!(format!("{client:?}").contains("ReqwestClient"));
    }

    #[test]
    fn client_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ReqwestClient>();
    }

    #[tokio::test]
    async fn connection_error_hides_url() {
        // Bind then drop a listener to get a local port that refuses connections.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let client = ReqwestClient::new();
        let url = url::Url::parse(&format!("http://127.0.0.1:{port}/botSECRET-TOKEN/sendMessage"))
            .unwrap();

        let result = client.request(HttpRequest::post(url)).await;

        match result {
            Err(e @ HttpError::Connection(_)) => {
                assert!(!format!("{e} {e:?}").contains("SECRET-TOKEN"));
            }
            // A configured HTTP proxy may answer with an error status instead.
            Ok(resp) if !resp.is_success() => {}
            other => panic!("Expected connection error, got {other:?}"),
        }
    }
}
