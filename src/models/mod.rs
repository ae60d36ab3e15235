//! Modelos del sistema
//!
//! Registros tipados por entidad, construidos en la frontera de almacenamiento.
//! Ningún mapa sin tipo cruza la frontera entre componentes.

pub mod payment;
pub mod reports;
pub mod session;
pub mod slot;
pub mod vehicle;

pub use payment::*;
pub use reports::*;
pub use session::*;
pub use slot::*;
pub use vehicle::*;
