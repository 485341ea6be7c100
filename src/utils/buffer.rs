// -------------------------------------------------------------------------------------------------

/// Copy a single channel of the given interleaved buffer into a mono buffer.
/// The mono buffer's length defines the number of copied frames.
pub fn interleaved_channel_to_mono(
    interleaved: &[f32],
    channel_count: usize,
    channel_index: usize,
    mono: &mut [f32],
) {
    debug_assert!(channel_index < channel_count);
    debug_assert!(interleaved.len() >= mono.len() * channel_count);
    match channel_count {
        1 => mono.copy_from_slice(&interleaved[..mono.len()]),
        _ => {
            for (m, frame) in mono.iter_mut().zip(interleaved.chunks_exact(channel_count)) {
                *m = frame[channel_index];
            }
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// Copy the given mono buffer into all channels of the given interleaved buffer.
/// The mono buffer's length defines the number of copied frames.
pub fn mono_to_interleaved(mono: &[f32], interleaved: &mut [f32], channel_count: usize) {
    debug_assert!(interleaved.len() >= mono.len() * channel_count);
    match channel_count {
        1 => interleaved[..mono.len()].copy_from_slice(mono),
        2 => {
            for (m, frame) in mono.iter().zip(interleaved.chunks_exact_mut(2)) {
                frame[0] = *m;
                frame[1] = *m;
            }
        }
        _ => {
            for (m, frame) in mono.iter().zip(interleaved.chunks_exact_mut(channel_count)) {
                frame.fill(*m);
            }
        }
    }
}

// -------------------------------------------------------------------------------------------------
