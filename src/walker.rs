use crate::error::{Error, ReadError};

/// Decodes one kind of table entry.
///
/// FPDT records and PPTT nodes are shaped differently: the former have a fixed
/// size per record type, the latter carry their own length. The walker doesn't
/// care; it only needs the decoded value and the number of bytes it occupies.
pub trait RecordDecoder {
    /// The decoded entry.
    type Record;

    /// The number of bytes needed to tell which kind of entry starts at an offset.
    const DISCRIMINANT_SIZE: usize;

    /// Which structure couldn't be read if fewer than `DISCRIMINANT_SIZE` bytes remain.
    const DISCRIMINANT_READ_ERROR: ReadError;

    /// Decode the entry starting at `offset`. `data` is the whole table,
    /// header included, so that offsets match the ones used inside the table.
    ///
    /// Returns the entry and the number of bytes it consumed. At least
    /// `DISCRIMINANT_SIZE` bytes are available at `offset`.
    fn decode(&mut self, data: &[u8], offset: usize) -> Result<(Self::Record, usize), Error>;
}

/// The state of a [`RecordWalker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkState {
    /// More entries may follow.
    Scanning,
    /// The last entry ended exactly at the end of the buffer.
    Done,
    /// An entry failed to decode. The walk can't be resumed.
    Failed,
}

/// A decoded entry together with its position in the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkedRecord<T> {
    /// The absolute offset of the entry in the table buffer.
    pub offset: usize,
    /// The number of bytes the entry occupies.
    pub length: usize,
    pub record: T,
}

/// Walks the sequence of entries which follows a table header.
///
/// Offsets only ever increase: every step either advances by a nonzero length
/// which stays within the buffer, or moves the walker into [`WalkState::Failed`].
#[derive(Debug, Clone)]
pub struct RecordWalker<'a, D: RecordDecoder> {
    data: &'a [u8],
    offset: usize,
    decoder: D,
    state: WalkState,
}

impl<'a, D: RecordDecoder> RecordWalker<'a, D> {
    /// Create a walker which starts decoding at `start_offset`, usually right after the header.
    pub fn new(data: &'a [u8], start_offset: usize, decoder: D) -> Self {
        Self {
            data,
            offset: start_offset,
            decoder,
            state: WalkState::Scanning,
        }
    }

    /// The offset of the next entry.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn state(&self) -> WalkState {
        self.state
    }

    pub fn decoder(&self) -> &D {
        &self.decoder
    }

    /// Hand back the decoder, along with anything it accumulated.
    pub fn into_decoder(self) -> D {
        self.decoder
    }

    /// Returns the next entry, or `None` once the end of the buffer is reached.
    ///
    /// After an error, every further call returns `None`.
    pub fn next_record(&mut self) -> Result<Option<WalkedRecord<D::Record>>, Error> {
        match self.state {
            WalkState::Scanning => {}
            WalkState::Done | WalkState::Failed => return Ok(None),
        }
        if self.offset >= self.data.len() {
            log::debug!("Reached the end of the table at offset {}", self.offset);
            self.state = WalkState::Done;
            return Ok(None);
        }
        match self.step() {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                self.state = WalkState::Failed;
                Err(e)
            }
        }
    }

    fn step(&mut self) -> Result<WalkedRecord<D::Record>, Error> {
        let offset = self.offset;
        let remaining = self.data.len() - offset;
        if remaining < D::DISCRIMINANT_SIZE {
            return Err(Error::Truncated {
                offset,
                what: D::DISCRIMINANT_READ_ERROR,
            });
        }

        let (record, length) = self.decoder.decode(self.data, offset)?;
        if length == 0 || length > remaining {
            return Err(Error::Malformed { offset, length });
        }

        log::trace!("Decoded entry at offset {offset} with length {length}");
        self.offset += length;
        Ok(WalkedRecord {
            offset,
            length,
            record,
        })
    }
}

impl<D: RecordDecoder> Iterator for RecordWalker<'_, D> {
    type Item = Result<WalkedRecord<D::Record>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}

#[cfg(test)]
mod test {
    use super::{RecordDecoder, RecordWalker, WalkState};
    use crate::error::{Error, ReadError};

    /// Entries are a length byte followed by that many bytes, minus one.
    struct LengthPrefixed;

    impl RecordDecoder for LengthPrefixed {
        type Record = u8;
        const DISCRIMINANT_SIZE: usize = 1;
        const DISCRIMINANT_READ_ERROR: ReadError = ReadError::PpttNodeType;

        fn decode(&mut self, data: &[u8], offset: usize) -> Result<(u8, usize), Error> {
            let len = data[offset];
            Ok((len, usize::from(len)))
        }
    }

    /// Always claims two-byte entries, so an odd-sized area can't be walked.
    struct Pairs;

    impl RecordDecoder for Pairs {
        type Record = ();
        const DISCRIMINANT_SIZE: usize = 2;
        const DISCRIMINANT_READ_ERROR: ReadError = ReadError::FpdtRecordHeader;

        fn decode(&mut self, _data: &[u8], _offset: usize) -> Result<((), usize), Error> {
            Ok(((), 2))
        }
    }

    #[test]
    fn walks_to_the_end() {
        let data = [0xaa, 0xbb, 2, 0, 3, 0, 0, 1];
        let mut walker = RecordWalker::new(&data, 2, LengthPrefixed);
        let mut offsets = Vec::new();
        while let Some(record) = walker.next_record().unwrap() {
            offsets.push(record.offset);
        }
        assert_eq!(offsets, vec![2, 4, 7]);
        assert_eq!(walker.offset(), data.len());
        assert_eq!(walker.state(), WalkState::Done);
        assert_eq!(walker.next_record(), Ok(None));
    }

    #[test]
    fn empty_record_area() {
        let data = [0xaa, 0xbb];
        let mut walker = RecordWalker::new(&data, 2, LengthPrefixed);
        assert_eq!(walker.next_record(), Ok(None));
        assert_eq!(walker.state(), WalkState::Done);
    }

    #[test]
    fn zero_length_stops() {
        let data = [2, 0, 0, 0];
        let mut walker = RecordWalker::new(&data, 0, LengthPrefixed);
        assert!(walker.next_record().unwrap().is_some());
        assert_eq!(
            walker.next_record(),
            Err(Error::Malformed {
                offset: 2,
                length: 0
            })
        );
        assert_eq!(walker.state(), WalkState::Failed);
        assert_eq!(walker.offset(), 2);
        assert_eq!(walker.next_record(), Ok(None));
    }

    #[test]
    fn overflowing_length_stops() {
        let data = [5, 0, 0];
        let mut walker = RecordWalker::new(&data, 0, LengthPrefixed);
        assert_eq!(
            walker.next_record(),
            Err(Error::Malformed {
                offset: 0,
                length: 5
            })
        );
        assert_eq!(walker.state(), WalkState::Failed);
    }

    #[test]
    fn truncated_discriminant() {
        let data = [0, 0, 0];
        let results: Vec<_> = RecordWalker::new(&data, 0, Pairs).collect();
        assert_eq!(
            results,
            vec![
                Ok(super::WalkedRecord {
                    offset: 0,
                    length: 2,
                    record: ()
                }),
                Err(Error::Truncated {
                    offset: 2,
                    what: ReadError::FpdtRecordHeader
                }),
            ]
        );
    }
}
