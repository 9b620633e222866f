//! Idle behavior: what the head does while nobody is around.

use crate::Result;

/// Background behavior started when no face has been seen for a while
pub trait IdleBehavior: Send {
    /// Start the behavior; starting a running behavior is a no-op
    fn start(&mut self) -> Result<()>;

    /// Stop the behavior and wait for it to settle; stopping a stopped one is a no-op
    fn stop(&mut self) -> Result<()>;

    fn is_running(&self) -> bool;
}

/// Idle behavior that keeps the head where it is
#[derive(Debug, Default)]
pub struct StayStill {
    running: bool,
}

impl IdleBehavior for StayStill {
    fn start(&mut self) -> Result<()> {
        self.running = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.running = false;
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running
    }
}
