//! Timing model: musical bars and notes mapped onto the frame grid

use std::collections::BTreeMap;
use std::time::Duration;

use crate::command::FrameState;
use crate::error::{RenderError, Result};
use crate::song::{BarChange, Song};

/// Frames in one whole note
pub const RENDER_FRAMES: u64 = 960;

/// Longest timeline a song may render to, about 2.4 hours of 4/4 at 120 bpm
pub const MAX_SONG_FRAMES: u64 = 1 << 22;

/// Bar changes keyed by the frame they take effect at
pub type BarChangeMap = BTreeMap<u64, BarChange>;

/// Index the bar changes of a song by frame. Later entries at the same frame
/// replace earlier ones.
pub fn streamline_bar_changes(song: &Song) -> BarChangeMap {
    song.bar_changes.iter().map(|bc| (bc.at, *bc)).collect()
}

/// Validate a streamlined bar change map.
///
/// Spacing between bar changes is deliberately not checked, a bar change may
/// cut the previous bar short.
pub fn validate_bar_changes(bar_changes: &BarChangeMap) -> Result<()> {
    if !bar_changes.contains_key(&0) {
        return Err(RenderError::MissingInitialBarChange);
    }

    for bc in bar_changes.values() {
        let reason = if bc.note_value == 0 {
            Some("note value must not be zero")
        } else if note_length(bc) == 0 {
            Some("note value exceeds the frame resolution")
        } else if bc.note_count == 0 {
            Some("note count must not be zero")
        } else if bc.speed == 0 {
            Some("speed must not be zero")
        } else {
            None
        };

        if let Some(reason) = reason {
            return Err(RenderError::InvalidBarChange { at: bc.at, reason });
        }
    }

    Ok(())
}

/// Frames in a single note of the given bar change. Zero for a zero note value.
pub fn note_length(bc: &BarChange) -> u64 {
    RENDER_FRAMES.checked_div(u64::from(bc.note_value)).unwrap_or(0)
}

/// Frames in a whole bar of the given bar change
pub fn bar_length(bc: &BarChange) -> u64 {
    u64::from(bc.note_count) * note_length(bc)
}

/// Real-world duration of a single frame while the given bar change governs.
///
/// `speed` counts notes of the bar change's subdivision per minute.
pub fn frame_duration(bc: &BarChange) -> Duration {
    let frames_per_minute = u128::from(bc.speed) * u128::from(note_length(bc));
    if frames_per_minute == 0 {
        return Duration::ZERO;
    }
    let nanos = 60_000_000_000u128 / frames_per_minute;
    Duration::from_nanos(nanos as u64)
}

/// Total frames of the grid [`frame_states`] lays out.
///
/// Fails when the grid would extend past [`MAX_SONG_FRAMES`].
pub fn song_length(bar_changes: &BarChangeMap, content_end: u64) -> Result<u64> {
    let Some((&at, bc)) = bar_changes.last_key_value() else {
        return Ok(0);
    };

    let bar_len = bar_length(bc);
    let end = if bar_len == 0 {
        Some(at)
    } else {
        let needed = content_end.saturating_sub(at).max(bar_len);
        needed
            .div_ceil(bar_len)
            .checked_mul(bar_len)
            .and_then(|frames| frames.checked_add(at))
    };

    match end {
        Some(frames) if frames <= MAX_SONG_FRAMES => Ok(frames),
        _ => Err(RenderError::TimelineTooLong {
            limit: MAX_SONG_FRAMES,
        }),
    }
}

/// Lay out the frame grid of a song.
///
/// Every bar change governs the frames up to the next one. The last bar change
/// spans at least one bar and is extended in whole bars until it covers
/// `content_end`. The map must have passed [`validate_bar_changes`].
pub fn frame_states(bar_changes: &BarChangeMap, content_end: u64) -> Result<Vec<FrameState>> {
    let total = song_length(bar_changes, content_end)?;
    let mut states = Vec::with_capacity(total as usize);
    let mut bar: u16 = 0;
    let mut entries = bar_changes.iter().peekable();

    while let Some((&at, bc)) = entries.next() {
        let bar_len = bar_length(bc);
        let note_len = note_length(bc);
        if bar_len == 0 {
            continue;
        }

        let end = entries.peek().map_or(total, |(&next, _)| next);
        for frame in at..end {
            let within = (frame - at) % bar_len;
            if within == 0 && frame != 0 {
                bar = bar.saturating_add(1);
            }
            states.push(FrameState {
                frame,
                bar,
                note: (within / note_len) as u8,
            });
        }
    }

    Ok(states)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bc(at: u64, note_value: u8, note_count: u8) -> BarChange {
        BarChange {
            at,
            note_value,
            note_count,
            speed: 120,
        }
    }

    #[test]
    fn test_lengths_for_four_four() {
        let four_four = bc(0, 4, 4);
        assert_eq!(note_length(&four_four), 240);
        assert_eq!(bar_length(&four_four), 960);
    }

    #[test]
    fn test_zero_note_value_does_not_divide() {
        assert_eq!(note_length(&bc(0, 0, 4)), 0);
        assert_eq!(frame_duration(&bc(0, 0, 4)), Duration::ZERO);
    }

    #[test]
    fn test_validate_requires_frame_zero() {
        let mut map = BarChangeMap::new();
        map.insert(960, bc(960, 4, 4));
        assert_eq!(
            validate_bar_changes(&map),
            Err(RenderError::MissingInitialBarChange)
        );
    }

    #[test]
    fn test_validate_rejects_zero_metre() {
        let mut map = BarChangeMap::new();
        map.insert(0, bc(0, 0, 4));
        assert!(matches!(
            validate_bar_changes(&map),
            Err(RenderError::InvalidBarChange { at: 0, .. })
        ));

        map.insert(0, bc(0, 4, 0));
        assert!(validate_bar_changes(&map).is_err());
    }

    #[test]
    fn test_frame_duration_at_120() {
        // 120 quarter notes per minute => 0.5s per note, 240 frames per note
        let duration = frame_duration(&bc(0, 4, 4));
        assert_eq!(duration, Duration::from_nanos(500_000_000 / 240));
    }

    #[test]
    fn test_frame_states_single_bar() {
        let mut map = BarChangeMap::new();
        map.insert(0, bc(0, 4, 4));

        let states = frame_states(&map, 0).unwrap();
        assert_eq!(states.len(), 960);
        assert_eq!(states[0], FrameState { frame: 0, bar: 0, note: 0 });
        assert_eq!(states[239].note, 0);
        assert_eq!(states[240].note, 1);
        assert_eq!(states[959].note, 3);
    }

    #[test]
    fn test_frame_states_extends_to_content() {
        let mut map = BarChangeMap::new();
        map.insert(0, bc(0, 4, 4));

        // content ends one frame into the third bar
        let states = frame_states(&map, 1921).unwrap();
        assert_eq!(states.len(), 2880);
        assert_eq!(states[960].bar, 1);
        assert_eq!(states[2879].bar, 2);
    }

    #[test]
    fn test_frame_states_bar_change_cuts_bar() {
        let mut map = BarChangeMap::new();
        map.insert(0, bc(0, 4, 4));
        map.insert(480, bc(480, 8, 3));

        let states = frame_states(&map, 0).unwrap();
        // half a 4/4 bar followed by one 3/8 bar
        assert_eq!(states.len(), 480 + 360);
        assert_eq!(states[479].bar, 0);
        assert_eq!(states[480], FrameState { frame: 480, bar: 1, note: 0 });
        assert_eq!(states[480 + 120].note, 1);
    }

    #[test]
    fn test_song_length_rejects_runaway_content() {
        let mut map = BarChangeMap::new();
        map.insert(0, bc(0, 4, 4));

        assert_eq!(song_length(&map, 1921), Ok(2880));
        assert_eq!(song_length(&map, MAX_SONG_FRAMES), Ok(MAX_SONG_FRAMES));
        for content_end in [MAX_SONG_FRAMES + 1, u64::MAX] {
            assert_eq!(
                frame_states(&map, content_end),
                Err(RenderError::TimelineTooLong {
                    limit: MAX_SONG_FRAMES
                })
            );
        }
    }

    #[test]
    fn test_song_length_rejects_distant_bar_change() {
        let mut map = BarChangeMap::new();
        map.insert(0, bc(0, 4, 4));
        map.insert(u64::MAX - 10, bc(u64::MAX - 10, 4, 4));

        assert!(matches!(
            song_length(&map, 0),
            Err(RenderError::TimelineTooLong { .. })
        ));
    }
}
