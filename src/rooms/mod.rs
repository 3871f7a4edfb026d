/*!
 * Rooms Module
 *
 * The room state store and the live AC state record it manages.
 */

pub mod state;
pub mod store;

pub use state::RoomState;
pub use store::RoomStore;
