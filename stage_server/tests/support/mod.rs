// One stage server per test binary, tuned so a whole stage plays out in about a second.
#![allow(dead_code)]
use stage_server::domain::tuning::StageSettings;
use std::sync::{OnceLock, mpsc};
use std::time::Duration;

pub struct TestServer {
    pub http_url: String,
    pub ws_url: String,
}

static SERVER: OnceLock<TestServer> = OnceLock::new();

const TICK_INTERVAL: Duration = Duration::from_millis(10);
const STARTUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Lives a pilot starts with on every test stage.
pub const INITIAL_LIVES: u8 = 2;

pub fn fast_settings() -> StageSettings {
    let mut settings = StageSettings::default();
    settings.stage.preparing_delay = 0.2;
    settings.stage.respawn_delay = 0.2;
    settings.stage.game_over_delay = 0.3;
    settings.player.initial_lives = INITIAL_LIVES;
    settings
}

pub fn server() -> &'static TestServer {
    SERVER.get_or_init(start)
}

fn start() -> TestServer {
    let (addr_tx, addr_rx) = mpsc::channel();

    // The server gets its own runtime so it outlives each #[tokio::test] runtime.
    std::thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .expect("test runtime");
        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                .await
                .expect("bind ephemeral test port");
            let addr = listener.local_addr().expect("local addr");
            addr_tx.send(addr).expect("publish test server address");

            stage_server::run_with_settings(listener, fast_settings(), TICK_INTERVAL)
                .await
                .expect("server failed");
        });
    });

    // The listener is bound before the address is sent, so connects queue up from here on.
    let addr = addr_rx
        .recv_timeout(STARTUP_TIMEOUT)
        .expect("test server did not start in time");

    TestServer {
        http_url: format!("http://{addr}"),
        ws_url: format!("ws://{addr}"),
    }
}
