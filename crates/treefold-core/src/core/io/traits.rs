use crate::core::models::pose::Pose;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Defines the interface for reading and writing structure file formats.
///
/// Implementors handle format-specific parsing and serialization; the path
/// helpers wrap files in buffered readers and writers.
pub trait StructureFile {
    /// The error type for I/O operations.
    type Error: Error + From<io::Error>;

    /// Reads a pose from a buffered reader.
    ///
    /// # Arguments
    ///
    /// * `reader` - The buffered reader to read from.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails or the records do not describe a
    /// buildable chain.
    fn read_from(reader: &mut impl BufRead) -> Result<Pose, Self::Error>;

    /// Writes every built atom of a pose.
    ///
    /// # Arguments
    ///
    /// * `pose` - The pose to write.
    /// * `writer` - The writer to output to.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_to(pose: &Pose, writer: &mut impl Write) -> Result<(), Self::Error>;

    /// Reads a pose from a file path.
    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Pose, Self::Error> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader)
    }

    /// Writes a pose to a file path, creating or truncating the file.
    fn write_to_path<P: AsRef<Path>>(pose: &Pose, path: P) -> Result<(), Self::Error> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(pose, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}
