// Keyboard teleop over Zenoh: publishes single command bytes for the manual controller
//
// WASD move, Z/X smooth turn, space stop, 0-9 speed level, R speed reset,
// U/J lift up/down, K lift stop, Esc quit.
//
// Run the robot with `--link zenoh` (and `--echo` to see its status here).

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use std::time::Duration;
use tracing::info;

use linebot_runtime::config::{TOPIC_CMD, TOPIC_STATUS};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;
    let publisher = session.declare_publisher(TOPIC_CMD).await?;
    let status = session.declare_subscriber(TOPIC_STATUS).await?;

    info!("Controls: WASD=move, Z/X=smooth turn, space=stop, 0-9=speed, R=full speed");
    info!("          U/J=lift up/down, K=lift stop, Esc=quit");

    enable_raw_mode()?;
    let result = run_teleop(&publisher, &status).await;
    disable_raw_mode()?;

    result
}

/// Command byte for a key, if the key is bound
fn command_for(code: KeyCode) -> Option<u8> {
    let byte = match code {
        KeyCode::Char('w') => b'F',
        KeyCode::Char('s') => b'B',
        KeyCode::Char('a') => b'L',
        KeyCode::Char('d') => b'R',
        KeyCode::Char('z') => b'G',
        KeyCode::Char('x') => b'I',
        KeyCode::Char(' ') => b'S',
        KeyCode::Char('r') => b'Q',
        KeyCode::Char('u') => b'W',
        KeyCode::Char('j') => b'U',
        KeyCode::Char('k') => b'w',
        KeyCode::Char(digit @ '0'..='9') => digit as u8,
        _ => return None,
    };
    Some(byte)
}

async fn run_teleop(
    publisher: &zenoh::pubsub::Publisher<'_>,
    status: &zenoh::pubsub::Subscriber<zenoh::handlers::FifoChannelHandler<zenoh::sample::Sample>>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    loop {
        // Poll for key with 20ms timeout (matches the robot's 50Hz loop)
        if event::poll(Duration::from_millis(20))? {
            if let Event::Key(KeyEvent { code, kind, .. }) = event::read()? {
                let pressed = kind == KeyEventKind::Press || kind == KeyEventKind::Repeat;
                if pressed && code == KeyCode::Esc {
                    break;
                }
                if let Some(byte) = command_for(code).filter(|_| pressed) {
                    publisher.put(vec![byte]).await?;
                }
            }
        }

        while let Ok(Some(sample)) = status.try_recv() {
            let text = String::from_utf8_lossy(&sample.payload().to_bytes()).into_owned();
            info!("Robot: {}\r", text);
        }
    }

    // Leave the robot stopped
    publisher.put(vec![b'S']).await?;
    Ok(())
}
