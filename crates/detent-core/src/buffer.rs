//! In-place audio buffer for the render callback.
//!
//! The host hands the plugin one mutable slice per channel; effects in this
//! crate process in place, so [`AudioBuffer`] holds only those slices.
//!
//! # Real-Time Safety
//!
//! Channel slices live in fixed-size stack storage. No heap allocations
//! occur during construction or use.
//!
//! ```ignore
//! let (left, right) = frames.split_at_mut(block);
//! let mut buffer = AudioBuffer::new([left, right], block);
//! processor.process(&mut buffer);
//! ```

use crate::sample::Sample;
use crate::types::MAX_CHANNELS;

/// Channel slices for one processing block.
///
/// `S` is the sample type, defaulting to `f32`. Channels beyond
/// [`MAX_CHANNELS`] are ignored, and every slice is viewed through its
/// first `num_samples` samples.
pub struct AudioBuffer<'a, S: Sample = f32> {
    // Can't use [None; N] for &mut because it's not Copy
    channels: [Option<&'a mut [S]>; MAX_CHANNELS],
    num_channels: usize,
    num_samples: usize,
}

impl<'a, S: Sample> AudioBuffer<'a, S> {
    /// Create a buffer from channel slices.
    ///
    /// `num_samples` is clamped to the shortest slice so indexing below it
    /// never goes out of bounds.
    #[inline]
    pub fn new(channels: impl IntoIterator<Item = &'a mut [S]>, num_samples: usize) -> Self {
        let mut slots: [Option<&'a mut [S]>; MAX_CHANNELS] = std::array::from_fn(|_| None);
        let mut num_channels = 0;
        let mut shortest = num_samples;
        for (index, slice) in channels.into_iter().take(MAX_CHANNELS).enumerate() {
            shortest = shortest.min(slice.len());
            slots[index] = Some(slice);
            num_channels = index + 1;
        }

        Self {
            channels: slots,
            num_channels,
            num_samples: shortest,
        }
    }

    /// Number of samples in this block.
    #[inline]
    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    /// Number of channels.
    #[inline]
    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    /// Returns true if there is nothing to process.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.num_samples == 0 || self.num_channels == 0
    }

    /// Read-only view of one channel (empty if it doesn't exist).
    #[inline]
    pub fn channel(&self, channel: usize) -> &[S] {
        self.channels
            .get(channel)
            .and_then(|slot| slot.as_deref())
            .map(|ch| &ch[..self.num_samples])
            .unwrap_or(&[])
    }

    /// Mutable view of one channel, `None` if it doesn't exist.
    #[inline]
    pub fn channel_mut(&mut self, channel: usize) -> Option<&mut [S]> {
        let n = self.num_samples;
        self.channels
            .get_mut(channel)
            .and_then(|slot| slot.as_deref_mut())
            .map(|ch| &mut ch[..n])
    }

    /// Iterate over all channels mutably.
    #[inline]
    pub fn channels_mut(&mut self) -> impl Iterator<Item = &mut [S]> + use<'_, 'a, S> {
        let n = self.num_samples;
        self.channels[..self.num_channels]
            .iter_mut()
            .filter_map(move |slot| slot.as_deref_mut().map(|ch| &mut ch[..n]))
    }

    /// Silence every channel.
    pub fn clear(&mut self) {
        for channel in self.channels_mut() {
            channel.fill(S::ZERO);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_access() {
        let mut left = [1.0f32; 4];
        let mut right = [2.0f32; 4];
        let mut buffer = AudioBuffer::new([&mut left[..], &mut right[..]], 4);

        assert_eq!(buffer.num_channels(), 2);
        assert_eq!(buffer.num_samples(), 4);
        assert_eq!(buffer.channel(1), &[2.0; 4]);
        assert!(buffer.channel(5).is_empty());
        assert!(buffer.channel_mut(2).is_none());

        buffer.clear();
        assert!(buffer.channel(0).iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_samples_clamped_to_shortest_slice() {
        let mut a = [0.0f64; 8];
        let mut b = [0.0f64; 3];
        let buffer = AudioBuffer::new([&mut a[..], &mut b[..]], 8);
        assert_eq!(buffer.num_samples(), 3);
        assert_eq!(buffer.channel(0).len(), 3);
    }

    #[test]
    fn test_empty_buffer() {
        let buffer: AudioBuffer<'_, f32> = AudioBuffer::new(std::iter::empty(), 64);
        assert!(buffer.is_empty());
        assert_eq!(buffer.num_channels(), 0);
    }
}
