//! The gesture document consumed by the translation stage.
//!
//! Layout is fixed: tab indentation, hands left then right, fingers and
//! folds in record order, booleans as `true`/`false`, floats with six
//! decimals. The document carries no timestamp or counter, so identical
//! cycles render identical bytes.

use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use glove_core::{Axes, Axis, FingerRole, FoldRole, Gesture, Mount, Side};
use tracing::debug;

use super::{GestureSink, OutputWriteError};

const HEADER: &str = concat!(
    "<?xml version=\"1.0\" encoding=\"utf-8\" standalone=\"no\"?>\n",
    "<?xml-stylesheet type=\"text/xsl\" href=\"gesture_data.xsl\"?>\n",
    "<!DOCTYPE gestures SYSTEM \"gesture_data.dtd\">\n",
);

pub const FORMAT_VERSION: &str = "1.0";

/// Default output file, watched by the translation stage.
pub const DEFAULT_OUTPUT_PATH: &str = "gesture_data_init.xml";

pub fn render(gesture: &Gesture) -> String {
    Document(gesture).to_string()
}

pub fn write_document<W: Write>(out: &mut W, gesture: &Gesture) -> io::Result<()> {
    write!(out, "{}", Document(gesture))
}

struct Document<'a>(&'a Gesture);

impl fmt::Display for Document<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let gesture = self.0;

        f.write_str(HEADER)?;
        writeln!(f, "<gestures>")?;
        writeln!(f, "\t<gesture>")?;
        for side in Side::ALL {
            write_hand(f, gesture, side)?;
        }
        writeln!(f, "\t</gesture>")?;
        writeln!(f, "\t<converted-text></converted-text>")?;
        writeln!(f, "\t<status>{}</status>", gesture.status)?;
        writeln!(f, "\t<convert>false</convert>")?;
        writeln!(f, "\t<version>{FORMAT_VERSION}</version>")?;
        writeln!(f, "</gestures>")
    }
}

fn write_hand(f: &mut fmt::Formatter<'_>, gesture: &Gesture, side: Side) -> fmt::Result {
    let hand = gesture.hand(side);
    writeln!(f, "\t\t<hand side=\"{side}\">")?;

    for role in FingerRole::ALL {
        let finger = hand.finger(role);
        writeln!(f, "\t\t\t<{}>", role.name())?;
        field(f, "flex", gesture.flex(side, role))?;
        for slot in role.contact_slots() {
            field(f, slot.name(), finger.contact[slot.index()])?;
        }
        writeln!(f, "\t\t\t</{}>", role.name())?;
    }

    for role in FoldRole::ALL {
        writeln!(f, "\t\t\t<{}>", role.name())?;
        field(f, "contact-tip", hand.fold(role).contact)?;
        writeln!(f, "\t\t\t</{}>", role.name())?;
    }

    for mount in Mount::ALL {
        let reading = &hand.six_axis[mount.index()];
        writeln!(f, "\t\t\t<lsm303 side=\"{}\">", mount.name())?;
        axes(f, "accel", &reading.accel)?;
        axes(f, "mag", &reading.mag)?;
        writeln!(f, "\t\t\t</lsm303>")?;
    }

    for mount in Mount::ALL {
        let reading = &hand.nine_axis[mount.index()];
        writeln!(f, "\t\t\t<lsm9dof side=\"{}\">", mount.name())?;
        axes(f, "accel", &reading.accel)?;
        axes(f, "mag", &reading.mag)?;
        axes(f, "gyro", &reading.gyro)?;
        writeln!(f, "\t\t\t</lsm9dof>")?;
    }

    writeln!(f, "\t\t</hand>")
}

fn axes(f: &mut fmt::Formatter<'_>, quantity: &str, axes: &Axes) -> fmt::Result {
    for axis in Axis::ALL {
        writeln!(
            f,
            "\t\t\t\t<{quantity}-{axis}>{value:.6}</{quantity}-{axis}>",
            axis = axis.name(),
            value = axes.get(axis),
        )?;
    }
    Ok(())
}

fn field(f: &mut fmt::Formatter<'_>, name: &str, value: impl fmt::Display) -> fmt::Result {
    writeln!(f, "\t\t\t\t<{name}>{value}</{name}>")
}

/// Replaces a file with the latest gesture every cycle.
///
/// The document is written next to the target and renamed over it, so a
/// reader polling the file never sees a partial cycle.
#[derive(Debug, Clone)]
pub struct XmlFileSink {
    path: PathBuf,
    staging: PathBuf,
}

impl XmlFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let staging = staging_path(&path);
        Self { path, staging }
    }

    fn replace(&self, document: &str) -> io::Result<()> {
        fs::write(&self.staging, document)
            .and_then(|()| fs::rename(&self.staging, &self.path))
            .inspect_err(|_| {
                let _ = fs::remove_file(&self.staging);
            })
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_else(OsString::new);
    name.push(".tmp");
    path.with_file_name(name)
}

impl GestureSink for XmlFileSink {
    fn emit(&mut self, gesture: &Gesture) -> Result<(), OutputWriteError> {
        self.replace(&render(gesture))
            .map_err(|source| OutputWriteError {
                target: self.path.display().to_string(),
                source,
            })?;
        debug!(path = ?self.path, "Gesture written");
        Ok(())
    }
}

/// Writes one complete document per cycle to a stream.
pub struct XmlStreamSink<W> {
    writer: W,
    target: String,
}

impl<W: Write> XmlStreamSink<W> {
    pub fn new(writer: W, target: impl Into<String>) -> Self {
        Self {
            writer,
            target: target.into(),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl XmlStreamSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout(), "stdout")
    }
}

impl<W: Write> GestureSink for XmlStreamSink<W> {
    fn emit(&mut self, gesture: &Gesture) -> Result<(), OutputWriteError> {
        write_document(&mut self.writer, gesture)
            .and_then(|()| self.writer.flush())
            .map_err(|source| OutputWriteError {
                target: self.target.clone(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glove_core::{CycleStatus, FlexNormalizer, HandRecord};

    fn gesture(right: HandRecord, status: CycleStatus) -> Gesture {
        Gesture::new(
            [HandRecord::default(), right],
            status,
            &FlexNormalizer::default(),
        )
    }

    #[test]
    fn document_has_fixed_frame() {
        let doc = render(&gesture(HandRecord::default(), CycleStatus::connected()));

        assert!(doc.starts_with(HEADER));
        assert!(doc.ends_with(
            "\t</gesture>\n\
             \t<converted-text></converted-text>\n\
             \t<status>connected</status>\n\
             \t<convert>false</convert>\n\
             \t<version>1.0</version>\n\
             </gestures>\n"
        ));
        assert_eq!(doc.lines().count(), 163);

        let left = doc.find("<hand side=\"left\">").unwrap();
        let right = doc.find("<hand side=\"right\">").unwrap();
        assert!(left < right);
    }

    #[test]
    fn thumb_has_only_tip_contact() {
        let doc = render(&gesture(HandRecord::default(), CycleStatus::connected()));

        assert!(doc.contains(
            "\t\t\t<thumb>\n\
             \t\t\t\t<flex>0</flex>\n\
             \t\t\t\t<contact-tip>false</contact-tip>\n\
             \t\t\t</thumb>\n"
        ));
        assert_eq!(doc.matches("<contact-mid>").count(), 8);
        assert_eq!(doc.matches("<contact-tip>").count(), 18);
    }

    #[test]
    fn values_render_as_normalized_buckets_booleans_and_fixed_floats() {
        let mut right = HandRecord::default();
        right.fingers[FingerRole::Index.index()].flex = 1023;
        right.fingers[FingerRole::Index.index()].contact[1] = true;
        right.folds[FoldRole::RingPinky.index()].contact = true;
        right.six_axis[Mount::Bottom.index()].accel.x = -12.0;
        right.nine_axis[Mount::Top.index()].gyro.z = 250.0;

        let doc = render(&gesture(right, CycleStatus::disconnected()));

        assert!(doc.contains(
            "\t\t\t<index>\n\
             \t\t\t\t<flex>100</flex>\n\
             \t\t\t\t<contact-tip>false</contact-tip>\n\
             \t\t\t\t<contact-mid>true</contact-mid>\n\
             \t\t\t</index>\n"
        ));
        assert!(doc.contains(
            "\t\t\t<ring-pinky>\n\t\t\t\t<contact-tip>true</contact-tip>\n\t\t\t</ring-pinky>\n"
        ));
        assert!(doc.contains(
            "\t\t\t<lsm303 side=\"bottom\">\n\t\t\t\t<accel-x>-12.000000</accel-x>\n"
        ));
        assert!(doc.contains("\t\t\t\t<gyro-z>250.000000</gyro-z>\n\t\t\t</lsm9dof>\n"));
        assert!(doc.contains("\t<status>disconnected</status>\n"));
    }

    #[test]
    fn file_sink_replaces_target_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gesture_data_init.xml");
        let mut sink = XmlFileSink::new(&path);
        let first = gesture(HandRecord::default(), CycleStatus::disconnected());
        let second = gesture(HandRecord::default(), CycleStatus::connected());

        sink.emit(&first).unwrap();
        sink.emit(&second).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), render(&second));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn file_sink_reports_target_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("gesture.xml");
        let mut sink = XmlFileSink::new(&path);

        let err = sink
            .emit(&gesture(HandRecord::default(), CycleStatus::connected()))
            .unwrap_err();

        assert_eq!(err.target, path.display().to_string());
        assert_eq!(err.source.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn stream_sink_writes_whole_documents() {
        let gesture = gesture(HandRecord::default(), CycleStatus::connected());
        let mut sink = XmlStreamSink::new(Vec::new(), "buffer");

        sink.emit(&gesture).unwrap();
        sink.emit(&gesture).unwrap();

        let written = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(written, render(&gesture).repeat(2));
    }

    #[test]
    fn failed_replace_leaves_no_staging_file() {
        let dir = tempfile::tempdir().unwrap();
        // a non-empty directory cannot be replaced by a file
        let path = dir.path().join("gesture.xml");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep"), "").unwrap();
        let mut sink = XmlFileSink::new(&path);

        let result = sink.emit(&gesture(HandRecord::default(), CycleStatus::connected()));

        assert!(result.is_err());
        assert!(!dir.path().join("gesture.xml.tmp").exists());
    }

    #[test]
    fn staging_file_sits_next_to_target() {
        assert_eq!(
            staging_path(Path::new("/var/glove/gesture_data_init.xml")),
            Path::new("/var/glove/gesture_data_init.xml.tmp")
        );
    }
}
