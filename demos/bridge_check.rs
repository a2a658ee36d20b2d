// Pin bridge check: ping the bridge, then (after confirmation) cycle one driver board
//
// Step 1 only reads. Step 2 drives the front L298N through every maneuver
// at low speed, so put the robot on blocks first.
//
// Usage: cargo run --example bridge_check -- [port]
// Example: cargo run --example bridge_check -- /dev/ttyACM0

use linebot_runtime::config::{BRIDGE_PORT, FRONT_PINS};
use linebot_runtime::hal::PinBridge;
use linebot_runtime::motor::{Direction, L298n, MotorDriverPort};
use std::io::{self, Write};
use std::rc::Rc;
use std::thread::sleep;
use std::time::Duration;

const TEST_SPEED: u8 = 80;
const HOLD: Duration = Duration::from_millis(1000);

fn confirm(prompt: &str) -> io::Result<bool> {
    print!("{} [y/N]: ", prompt);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .init();

    let port = std::env::args()
        .nth(1)
        .unwrap_or_else(|| BRIDGE_PORT.to_string());

    println!("Pin bridge check");
    println!("Serial port: {}", port);
    println!();

    println!("Step 1: Opening serial port and pinging the bridge...");
    let bridge = match PinBridge::open(&port) {
        Ok(bridge) => bridge,
        Err(e) => {
            println!("  Failed to open serial port: {}", e);
            println!();
            println!("Troubleshooting:");
            println!("  - Check the port path is correct");
            println!("  - Verify the bridge firmware is flashed and the USB cable is connected");
            return Err(e.into());
        }
    };

    match bridge.ping() {
        Ok(true) => println!("  Bridge {} responding", bridge.id()),
        Ok(false) => {
            println!("  Bridge {} did not answer", bridge.id());
            return Ok(());
        }
        Err(e) => {
            println!("  Ping failed: {}", e);
            return Err(e.into());
        }
    }
    println!();

    if !confirm("Step 2 drives the front motors. Are the wheels OFF THE GROUND?")? {
        println!("Aborted.");
        return Ok(());
    }

    println!("Step 2: Cycling maneuvers on {:?} at speed {}", FRONT_PINS, TEST_SPEED);
    let mut driver = L298n::new(Rc::new(bridge), FRONT_PINS);
    for direction in Direction::ALL {
        println!("  {}", direction.tag());
        driver.drive(direction, TEST_SPEED);
        sleep(HOLD);
    }
    driver.stop();

    println!();
    println!("Check complete. If every maneuver turned the wheels as named,");
    println!("the wiring matches the default pin map.");

    Ok(())
}
