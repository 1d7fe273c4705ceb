mod pricing;
mod reservation;
mod room;
mod time;

pub use self::pricing::*;
pub use self::reservation::*;
pub use self::room::*;
pub use self::time::*;
