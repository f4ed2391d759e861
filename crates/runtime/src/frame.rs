/// Display-cadence frame metadata.
///
/// Frames are numbered from the first tick of a render loop; time advances by
/// a fixed `dt_s` per frame so a recorded sequence replays identically.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    /// 0-based frame index.
    pub index: u64,
    /// Fixed delta time (seconds).
    pub dt_s: f64,
    /// Time at the start of the frame (seconds).
    pub time_s: f64,
}

impl Frame {
    /// Nominal display refresh interval.
    pub const DISPLAY_DT_S: f64 = 1.0 / 60.0;

    pub fn new(index: u64, dt_s: f64) -> Self {
        Self {
            index,
            dt_s,
            time_s: index as f64 * dt_s,
        }
    }

    pub fn first() -> Self {
        Self::new(0, Self::DISPLAY_DT_S)
    }

    pub fn next(self) -> Self {
        Self::new(self.index + 1, self.dt_s)
    }
}

#[cfg(test)]
mod tests {
    use super::Frame;

    #[test]
    fn frame_time_is_deterministic() {
        let a = Frame::new(10, 1.0 / 60.0);
        assert_eq!(a, Frame::new(10, 1.0 / 60.0));
        assert_eq!(a.time_s, 10.0 / 60.0);
    }

    #[test]
    fn next_advances_index_and_time() {
        let f1 = Frame::new(0, 0.5).next();
        assert_eq!(f1.index, 1);
        assert_eq!(f1.time_s, 0.5);
        assert_eq!(Frame::first().dt_s, Frame::DISPLAY_DT_S);
    }
}
