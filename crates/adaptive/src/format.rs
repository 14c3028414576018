//! Stream format identification.
//!
//! Formats are resolved by inspecting a bounded prefix of the first chunk of a
//! stream; the MIME content type is the fallback when the bytes are
//! inconclusive.

use std::fmt::Display;

/// Container format of a media stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamFormat {
    /// Format not yet resolved
    Unknown,
    /// Resolved to something no demuxer handles
    Unsupported,
    /// MPEG-2 Transport Stream
    TransportStream,
    /// MP4 fragment (fMP4/CMAF)
    FragmentedMp4,
    /// WebVTT subtitles
    WebVtt,
    /// Packed AAC audio (ADTS framing)
    PackedAac,
    /// Packed MPEG audio
    PackedMp3,
}

impl Display for StreamFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamFormat::Unknown => write!(f, "unknown"),
            StreamFormat::Unsupported => write!(f, "unsupported"),
            StreamFormat::TransportStream => write!(f, "ts"),
            StreamFormat::FragmentedMp4 => write!(f, "m4s"),
            StreamFormat::WebVtt => write!(f, "webvtt"),
            StreamFormat::PackedAac => write!(f, "aac"),
            StreamFormat::PackedMp3 => write!(f, "mp3"),
        }
    }
}

/// Detect the format of a media stream from its leading bytes
#[inline]
pub fn detect_format(data: &[u8]) -> StreamFormat {
    if data.len() < 4 {
        return StreamFormat::Unknown;
    }

    // TS sync byte pattern (0x47 every 188 bytes)
    if data[0] == 0x47 && data.len() > 188 && data[188] == 0x47 {
        return StreamFormat::TransportStream;
    }

    // MP4 box signature: ftyp, styp, moof, moov or sidx as the first box
    if data.len() >= 8 {
        let box_type = &data[4..8];
        if box_type == b"ftyp"
            || box_type == b"styp"
            || box_type == b"moof"
            || box_type == b"moov"
            || box_type == b"sidx"
        {
            return StreamFormat::FragmentedMp4;
        }
    }

    // WebVTT signature, possibly behind a UTF-8 BOM
    let text = if data.starts_with(&[0xEF, 0xBB, 0xBF]) {
        &data[3..]
    } else {
        data
    };
    if text.len() >= 6 && &text[0..6] == b"WEBVTT" {
        return StreamFormat::WebVtt;
    }

    // Packed audio: an ID3 tag precedes ADTS in HLS audio renditions
    if &data[0..3] == b"ID3" {
        return StreamFormat::PackedAac;
    }
    if data[0] == 0xFF && (data[1] & 0xF6) == 0xF0 {
        return StreamFormat::PackedAac;
    }
    if data[0] == 0xFF && (data[1] & 0xE0) == 0xE0 {
        return StreamFormat::PackedMp3;
    }

    StreamFormat::Unknown
}

/// Map a MIME content type to a stream format.
///
/// An unrecognized but present content type maps to `Unsupported`; an empty
/// one stays `Unknown`.
pub fn format_from_mime(content_type: &str) -> StreamFormat {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match essence.as_str() {
        "" => StreamFormat::Unknown,
        "video/mp2t" => StreamFormat::TransportStream,
        "video/mp4" | "audio/mp4" | "application/mp4" => StreamFormat::FragmentedMp4,
        "text/vtt" => StreamFormat::WebVtt,
        "audio/aac" | "audio/aacp" => StreamFormat::PackedAac,
        "audio/mpeg" | "audio/mp3" => StreamFormat::PackedMp3,
        _ => StreamFormat::Unsupported,
    }
}
