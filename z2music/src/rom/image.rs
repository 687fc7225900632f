//! Raw ROM image storage and byte-level access

use std::{
    fs::File,
    io::{self, Read, Write},
    path::Path,
};
use tracing::warn;

/// The raw bytes of a ROM image: a fixed-size header followed by the data region
///
/// All addresses used throughout this crate are absolute offsets into the flat data
/// region; the cartridge's bank-segmented view is folded into one array. Reads
/// outside the region yield 0xff (open bus) and writes outside it are dropped, so
/// decode passes over imperfect images degrade instead of panicking.
///
/// ```no_run
/// # use z2music::rom::image::Image;
/// let image = Image::from_path("zelda2.nes")?;
/// image.to_path("zelda2-copy.nes")?;
/// # Ok::<(), std::io::Error>(())
/// ```
#[derive(Clone)]
pub struct Image {
    header: [u8; Self::HEADER_LEN],
    data: Vec<u8>,
}

impl Image {
    /// The length in bytes of the image header
    pub const HEADER_LEN: usize = 0x10;

    /// The length in bytes of the data region
    pub const LEN: usize = 0x040000;

    /// Construct a zero-filled image
    pub fn new() -> Self {
        Self {
            header: [0; Self::HEADER_LEN],
            data: vec![0; Self::LEN],
        }
    }

    /// Deserialize an image from an arbitrary I/O reader
    pub fn from_reader<R>(mut reader: R) -> Result<Self, io::Error>
    where
        R: Read,
    {
        let mut header = [0; Self::HEADER_LEN];
        reader.read_exact(&mut header)?;

        let mut data = vec![0; Self::LEN];
        reader.read_exact(data.as_mut_slice())?;

        Ok(Self { header, data })
    }

    /// Deserialize an image from a path on disk
    pub fn from_path<P>(path: P) -> Result<Self, io::Error>
    where
        P: AsRef<Path>,
    {
        Self::from_reader(File::open(path)?)
    }

    /// Serialize the image to an arbitrary I/O writer
    pub fn to_writer<W>(&self, mut writer: W) -> Result<(), io::Error>
    where
        W: Write,
    {
        writer.write_all(&self.header)?;
        writer.write_all(&self.data)?;

        Ok(())
    }

    /// Serialize the image to a path on disk
    pub fn to_path<P>(&self, path: P) -> Result<(), io::Error>
    where
        P: AsRef<Path>,
    {
        self.to_writer(File::create(path)?)
    }

    /// Is an address within the data region?
    pub fn contains(&self, address: usize) -> bool {
        address < Self::LEN
    }

    /// Read a single byte; out-of-range reads yield 0xff
    pub fn get(&self, address: usize) -> u8 {
        match self.data.get(address) {
            Some(byte) => *byte,
            None => 0xff,
        }
    }

    /// Read a little-endian 16-bit word
    pub fn get_word(&self, address: usize) -> u16 {
        u16::from_le_bytes([self.get(address), self.get(address + 1)])
    }

    /// Read a big-endian 16-bit word
    pub fn get_word_be(&self, address: usize) -> u16 {
        u16::from_be_bytes([self.get(address), self.get(address + 1)])
    }

    /// Write a single byte; out-of-range writes are dropped
    pub fn put(&mut self, address: usize, byte: u8) {
        match self.data.get_mut(address) {
            Some(slot) => *slot = byte,
            None => warn!("dropping write of {byte:#04x} to out-of-range address {address:#x}"),
        }
    }

    /// Write a little-endian 16-bit word
    pub fn put_word(&mut self, address: usize, word: u16) {
        let [low, high] = word.to_le_bytes();
        self.put(address, low);
        self.put(address + 1, high);
    }

    /// Write a big-endian 16-bit word
    pub fn put_word_be(&mut self, address: usize, word: u16) {
        let [high, low] = word.to_be_bytes();
        self.put(address, high);
        self.put(address + 1, low);
    }

    /// Read `length` bytes starting at an address
    pub fn read(&self, address: usize, length: usize) -> Vec<u8> {
        (address..address + length).map(|a| self.get(a)).collect()
    }

    /// Write a run of bytes starting at an address
    pub fn write(&mut self, address: usize, bytes: &[u8]) {
        for (i, byte) in bytes.iter().enumerate() {
            self.put(address + i, *byte);
        }
    }
}

impl Default for Image {
    fn default() -> Self {
        Self::new()
    }
}
