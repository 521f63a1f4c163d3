/// Appear/decay ramps and global frame numbering.
pub mod framer;
/// Greedy edge-reveal walk.
pub mod walk;
