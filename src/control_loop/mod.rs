mod clock;
mod control_loop;
mod shutdown;

pub use clock::Clock;
pub use clock::RealClock;
pub use control_loop::ControlLoop;
pub use shutdown::shutdown_signal;
pub use shutdown::ShutdownHandle;
pub use shutdown::ShutdownSignal;
