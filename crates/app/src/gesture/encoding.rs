//! PNG payload generation for the inference upload.

use anyhow::{Context, Result, bail};
use image::{ExtendedColorType, ImageEncoder, codecs::png::PngEncoder};

use frame_ingest::{Frame, FrameFormat};

/// Encode a raw frame into the PNG payload uploaded to the endpoint.
pub(crate) fn encode_png(frame: &Frame) -> Result<Vec<u8>> {
    let bytes_per_pixel = match frame.format {
        FrameFormat::Rgb8 => 3,
    };
    let expected = frame.width as usize * frame.height as usize * bytes_per_pixel;
    if frame.data.len() != expected {
        bail!(
            "frame buffer is {} bytes, expected {expected} for {}x{}",
            frame.data.len(),
            frame.width,
            frame.height
        );
    }

    let mut payload = Vec::new();
    PngEncoder::new(&mut payload)
        .write_image(
            &frame.data,
            frame.width,
            frame.height,
            ExtendedColorType::Rgb8,
        )
        .context("failed to encode frame as PNG")?;
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(width: u32, height: u32, data: Vec<u8>) -> Frame {
        Frame {
            data,
            width,
            height,
            timestamp_ms: 0,
            format: FrameFormat::Rgb8,
        }
    }

    #[test]
    fn produces_a_decodable_png() {
        let payload = encode_png(&frame(2, 2, vec![128; 12])).expect("encode");
        assert_eq!(&payload[..4], &[0x89, b'P', b'N', b'G']);

        let decoded = image::load_from_memory(&payload).expect("decode");
        assert_eq!(decoded.width(), 2);
        assert_eq!(decoded.height(), 2);
    }

    #[test]
    fn rejects_mismatched_buffer_length() {
        assert!(encode_png(&frame(2, 2, vec![0; 5])).is_err());
    }
}
