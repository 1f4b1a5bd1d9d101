use anyhow::{anyhow, bail, Result};
use std::str::FromStr;

pub const PROMPT: &str = "Enter command (takeoff, land, charge, capture, shutdown): ";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Optional target altitude in meters.
    Takeoff(Option<f32>),
    Land,
    Charge,
    Capture,
    Shutdown,
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(input: &str) -> Result<Self> {
        let input = input.trim().to_lowercase();
        let mut parts = input.split_whitespace();
        let name = parts.next().unwrap_or_default();
        let arg = parts.next();
        if parts.next().is_some() {
            bail!("Unknown command: {}", input);
        }

        let command = match (name, arg) {
            ("takeoff", None) => Command::Takeoff(None),
            ("takeoff", Some(altitude)) => Command::Takeoff(Some(
                altitude
                    .parse()
                    .map_err(|_| anyhow!("Invalid altitude: {}", altitude))?,
            )),
            ("land", None) => Command::Land,
            ("charge", None) => Command::Charge,
            ("capture", None) => Command::Capture,
            ("shutdown", None) => Command::Shutdown,
            _ => bail!("Unknown command: {}", input),
        };
        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() -> Result<()> {
        assert_eq!("takeoff".parse::<Command>()?, Command::Takeoff(None));
        assert_eq!("  LAND \n".parse::<Command>()?, Command::Land);
        assert_eq!("Charge".parse::<Command>()?, Command::Charge);
        assert_eq!("capture".parse::<Command>()?, Command::Capture);
        assert_eq!("shutdown".parse::<Command>()?, Command::Shutdown);
        assert_eq!(
            "takeoff 3.5".parse::<Command>()?,
            Command::Takeoff(Some(3.5))
        );
        Ok(())
    }

    #[test]
    fn test_reject_unknown_input() {
        for input in ["", "fly", "land now", "takeoff high", "takeoff 1 2"] {
            assert!(input.parse::<Command>().is_err(), "accepted {:?}", input);
        }
    }
}
