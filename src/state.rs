// Represents the current high-level state of the application UI
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum State {
    Initialising, // Window is up, initial bus scan pending
    Running,      // Control panel showing the interfaces
    About,        // Showing the about screen
}
