use coolcart::{App, Config};
use wiremock::MockServer;

pub struct TestApp {
    pub app: App,
    pub server: MockServer,
    _dir: tempfile::TempDir,
}

/// An [`App`] wired to a fresh mock backend and a throwaway state dir.
pub async fn test_app() -> TestApp {
    let server = MockServer::start().await;
    let dir = tempfile::TempDir::new().unwrap();
    let config = Config {
        api_base_url: server.uri(),
        state_dir: dir.path().to_path_buf(),
        ..Config::default()
    };
    TestApp {
        app: App::init(config),
        server,
        _dir: dir,
    }
}
