//! Binary encoding of constraint systems.
//!
//! Layout: a header (`b"R1CS"`, format version, curve tag, field byte width), the coefficient
//! table, the wire counts, then constraints, hints, debug traces and logs. Arrays and strings are
//! prefixed by their length as a little-endian `u64`; field elements use the arkworks canonical
//! compressed form. Derived data (the hint index, the logger output) is not encoded and is
//! rebuilt on decoding, so a given system always encodes to the same bytes.

use std::io::{self, Read, Write};

use ark_serialize::{
    CanonicalDeserialize, CanonicalSerialize, Compress, SerializationError, Valid, Validate,
};

use crate::coefficients::{CoeffId, CoeffTable};
use crate::constraint_system::{index_hints, CompiledR1CS, Hint, R1CS, R1C};
use crate::curve::{CurveField, CurveId};
use crate::debug::{LogEntry, LogItem};
use crate::error::Error;
use crate::hint::HintId;
use crate::linear_combination::{LinearExpression, Term, Variable, Visibility, WireId};

/// Largest array (or string) length accepted when decoding.
pub const MAX_ARRAY_ELEMENTS: u64 = 134_217_728;

const MAGIC: [u8; 4] = *b"R1CS";
const VERSION: u8 = 1;
const HEADER_SIZE: usize = 4 + 1 + 1 + 4;

// don't trust a decoded length for more than this many slots up front
const MAX_PREALLOC: usize = 1 << 12;

fn read_len<R: Read>(
    mut reader: R,
    compress: Compress,
    validate: Validate,
) -> Result<usize, SerializationError> {
    let len = u64::deserialize_with_mode(&mut reader, compress, validate)?;
    if len > MAX_ARRAY_ELEMENTS {
        tracing::warn!(
            len,
            max = MAX_ARRAY_ELEMENTS,
            "rejecting array longer than the element ceiling"
        );
        return Err(SerializationError::InvalidData);
    }
    Ok(len as usize)
}

fn serialize_slice<T: CanonicalSerialize, W: Write>(
    items: &[T],
    mut writer: W,
    compress: Compress,
) -> Result<(), SerializationError> {
    (items.len() as u64).serialize_with_mode(&mut writer, compress)?;
    for item in items {
        item.serialize_with_mode(&mut writer, compress)?;
    }
    Ok(())
}

fn slice_size<T: CanonicalSerialize>(items: &[T], compress: Compress) -> usize {
    8 + items
        .iter()
        .map(|item| item.serialized_size(compress))
        .sum::<usize>()
}

fn deserialize_vec<T: CanonicalDeserialize, R: Read>(
    mut reader: R,
    compress: Compress,
    validate: Validate,
) -> Result<Vec<T>, SerializationError> {
    let len = read_len(&mut reader, compress, validate)?;
    let mut items = Vec::with_capacity(len.min(MAX_PREALLOC));
    for _ in 0..len {
        items.push(T::deserialize_with_mode(&mut reader, compress, validate)?);
    }
    Ok(items)
}

fn serialize_str<W: Write>(
    s: &str,
    mut writer: W,
    compress: Compress,
) -> Result<(), SerializationError> {
    (s.len() as u64).serialize_with_mode(&mut writer, compress)?;
    writer.write_all(s.as_bytes())?;
    Ok(())
}

fn deserialize_string<R: Read>(
    mut reader: R,
    compress: Compress,
    validate: Validate,
) -> Result<String, SerializationError> {
    let len = read_len(&mut reader, compress, validate)?;
    let mut bytes = Vec::with_capacity(len.min(MAX_PREALLOC));
    (&mut reader).take(len as u64).read_to_end(&mut bytes)?;
    if bytes.len() != len {
        return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
    }
    String::from_utf8(bytes).map_err(|_| SerializationError::InvalidData)
}

fn deserialize_wire<R: Read>(
    reader: R,
    compress: Compress,
    validate: Validate,
) -> Result<WireId, SerializationError> {
    let wire = u64::deserialize_with_mode(reader, compress, validate)?;
    WireId::try_from(wire).map_err(|_| SerializationError::InvalidData)
}

macro_rules! trivially_valid {
    ($($t:ty),*) => {
        $(
            impl Valid for $t {
                fn check(&self) -> Result<(), SerializationError> {
                    Ok(())
                }
            }
        )*
    };
}

trivially_valid!(CoeffId, Visibility, Term, LinearExpression, R1C, HintId, Hint, LogItem, LogEntry);

impl CanonicalSerialize for CoeffId {
    fn serialize_with_mode<W: Write>(
        &self,
        writer: W,
        compress: Compress,
    ) -> Result<(), SerializationError> {
        self.0.serialize_with_mode(writer, compress)
    }

    fn serialized_size(&self, _compress: Compress) -> usize {
        4
    }
}

impl CanonicalDeserialize for CoeffId {
    fn deserialize_with_mode<R: Read>(
        reader: R,
        compress: Compress,
        validate: Validate,
    ) -> Result<Self, SerializationError> {
        Ok(CoeffId(u32::deserialize_with_mode(reader, compress, validate)?))
    }
}

impl CanonicalSerialize for Visibility {
    fn serialize_with_mode<W: Write>(
        &self,
        writer: W,
        compress: Compress,
    ) -> Result<(), SerializationError> {
        self.to_u8().serialize_with_mode(writer, compress)
    }

    fn serialized_size(&self, _compress: Compress) -> usize {
        1
    }
}

impl CanonicalDeserialize for Visibility {
    fn deserialize_with_mode<R: Read>(
        reader: R,
        compress: Compress,
        validate: Validate,
    ) -> Result<Self, SerializationError> {
        let tag = u8::deserialize_with_mode(reader, compress, validate)?;
        Visibility::from_u8(tag).ok_or(SerializationError::InvalidData)
    }
}

impl CanonicalSerialize for Term {
    fn serialize_with_mode<W: Write>(
        &self,
        mut writer: W,
        compress: Compress,
    ) -> Result<(), SerializationError> {
        (self.wire() as u64).serialize_with_mode(&mut writer, compress)?;
        self.variable
            .visibility
            .serialize_with_mode(&mut writer, compress)?;
        self.coeff.serialize_with_mode(&mut writer, compress)
    }

    fn serialized_size(&self, _compress: Compress) -> usize {
        8 + 1 + 4
    }
}

impl CanonicalDeserialize for Term {
    fn deserialize_with_mode<R: Read>(
        mut reader: R,
        compress: Compress,
        validate: Validate,
    ) -> Result<Self, SerializationError> {
        let wire = deserialize_wire(&mut reader, compress, validate)?;
        let visibility = Visibility::deserialize_with_mode(&mut reader, compress, validate)?;
        let coeff = CoeffId::deserialize_with_mode(&mut reader, compress, validate)?;
        Ok(Term::new(Variable::new(wire, visibility), coeff))
    }
}

impl CanonicalSerialize for LinearExpression {
    fn serialize_with_mode<W: Write>(
        &self,
        writer: W,
        compress: Compress,
    ) -> Result<(), SerializationError> {
        serialize_slice(&self.terms, writer, compress)
    }

    fn serialized_size(&self, compress: Compress) -> usize {
        slice_size(&self.terms, compress)
    }
}

impl CanonicalDeserialize for LinearExpression {
    fn deserialize_with_mode<R: Read>(
        reader: R,
        compress: Compress,
        validate: Validate,
    ) -> Result<Self, SerializationError> {
        Ok(LinearExpression::new(deserialize_vec(
            reader, compress, validate,
        )?))
    }
}

impl CanonicalSerialize for R1C {
    fn serialize_with_mode<W: Write>(
        &self,
        mut writer: W,
        compress: Compress,
    ) -> Result<(), SerializationError> {
        self.l.serialize_with_mode(&mut writer, compress)?;
        self.r.serialize_with_mode(&mut writer, compress)?;
        self.o.serialize_with_mode(&mut writer, compress)
    }

    fn serialized_size(&self, compress: Compress) -> usize {
        self.l.serialized_size(compress)
            + self.r.serialized_size(compress)
            + self.o.serialized_size(compress)
    }
}

impl CanonicalDeserialize for R1C {
    fn deserialize_with_mode<R: Read>(
        mut reader: R,
        compress: Compress,
        validate: Validate,
    ) -> Result<Self, SerializationError> {
        Ok(R1C {
            l: LinearExpression::deserialize_with_mode(&mut reader, compress, validate)?,
            r: LinearExpression::deserialize_with_mode(&mut reader, compress, validate)?,
            o: LinearExpression::deserialize_with_mode(&mut reader, compress, validate)?,
        })
    }
}

impl CanonicalSerialize for HintId {
    fn serialize_with_mode<W: Write>(
        &self,
        writer: W,
        compress: Compress,
    ) -> Result<(), SerializationError> {
        self.0.serialize_with_mode(writer, compress)
    }

    fn serialized_size(&self, _compress: Compress) -> usize {
        4
    }
}

impl CanonicalDeserialize for HintId {
    fn deserialize_with_mode<R: Read>(
        reader: R,
        compress: Compress,
        validate: Validate,
    ) -> Result<Self, SerializationError> {
        Ok(HintId(u32::deserialize_with_mode(reader, compress, validate)?))
    }
}

impl CanonicalSerialize for Hint {
    fn serialize_with_mode<W: Write>(
        &self,
        mut writer: W,
        compress: Compress,
    ) -> Result<(), SerializationError> {
        (self.wire as u64).serialize_with_mode(&mut writer, compress)?;
        self.id.serialize_with_mode(&mut writer, compress)?;
        serialize_slice(&self.inputs, &mut writer, compress)
    }

    fn serialized_size(&self, compress: Compress) -> usize {
        8 + 4 + slice_size(&self.inputs, compress)
    }
}

impl CanonicalDeserialize for Hint {
    fn deserialize_with_mode<R: Read>(
        mut reader: R,
        compress: Compress,
        validate: Validate,
    ) -> Result<Self, SerializationError> {
        Ok(Hint {
            wire: deserialize_wire(&mut reader, compress, validate)?,
            id: HintId::deserialize_with_mode(&mut reader, compress, validate)?,
            inputs: deserialize_vec(&mut reader, compress, validate)?,
        })
    }
}

impl CanonicalSerialize for LogItem {
    fn serialize_with_mode<W: Write>(
        &self,
        mut writer: W,
        compress: Compress,
    ) -> Result<(), SerializationError> {
        match self {
            LogItem::Term(t) => {
                0u8.serialize_with_mode(&mut writer, compress)?;
                t.serialize_with_mode(&mut writer, compress)
            }
            LogItem::Eval(expr) => {
                1u8.serialize_with_mode(&mut writer, compress)?;
                expr.serialize_with_mode(&mut writer, compress)
            }
        }
    }

    fn serialized_size(&self, compress: Compress) -> usize {
        1 + match self {
            LogItem::Term(t) => t.serialized_size(compress),
            LogItem::Eval(expr) => expr.serialized_size(compress),
        }
    }
}

impl CanonicalDeserialize for LogItem {
    fn deserialize_with_mode<R: Read>(
        mut reader: R,
        compress: Compress,
        validate: Validate,
    ) -> Result<Self, SerializationError> {
        match u8::deserialize_with_mode(&mut reader, compress, validate)? {
            0 => Ok(LogItem::Term(Term::deserialize_with_mode(
                &mut reader,
                compress,
                validate,
            )?)),
            1 => Ok(LogItem::Eval(LinearExpression::deserialize_with_mode(
                &mut reader,
                compress,
                validate,
            )?)),
            _ => Err(SerializationError::InvalidData),
        }
    }
}

impl CanonicalSerialize for LogEntry {
    fn serialize_with_mode<W: Write>(
        &self,
        mut writer: W,
        compress: Compress,
    ) -> Result<(), SerializationError> {
        serialize_str(&self.format, &mut writer, compress)?;
        serialize_slice(&self.items, &mut writer, compress)
    }

    fn serialized_size(&self, compress: Compress) -> usize {
        8 + self.format.len() + slice_size(&self.items, compress)
    }
}

impl CanonicalDeserialize for LogEntry {
    fn deserialize_with_mode<R: Read>(
        mut reader: R,
        compress: Compress,
        validate: Validate,
    ) -> Result<Self, SerializationError> {
        let format = deserialize_string(&mut reader, compress, validate)?;
        let items = deserialize_vec(&mut reader, compress, validate)?;
        Ok(LogEntry { format, items })
    }
}

/// Total wire count, rejected when it overflows or exceeds the element ceiling: a solve allocates
/// one slot per wire.
fn checked_nb_wires(
    nb_public: usize,
    nb_secret: usize,
    nb_internal: usize,
) -> Result<usize, SerializationError> {
    let total = nb_public
        .checked_add(nb_secret)
        .and_then(|n| n.checked_add(nb_internal));
    match total {
        Some(n) if n as u64 <= MAX_ARRAY_ELEMENTS => Ok(n),
        _ => {
            tracing::warn!(
                nb_public,
                nb_secret,
                nb_internal,
                max = MAX_ARRAY_ELEMENTS,
                "rejecting wire counts above the element ceiling"
            );
            Err(SerializationError::InvalidData)
        }
    }
}

impl Valid for CompiledR1CS {
    fn check(&self) -> Result<(), SerializationError> {
        if self.nb_public_variables == 0 {
            // wire 0 is always public
            return Err(SerializationError::InvalidData);
        }
        index_hints(&self.hints).map_err(|_| SerializationError::InvalidData)?;
        let nb_wires = checked_nb_wires(
            self.nb_public_variables,
            self.nb_secret_variables,
            self.nb_internal_variables,
        )?;
        for hint in self.hints.iter() {
            if hint.wire >= nb_wires {
                return Err(SerializationError::InvalidData);
            }
        }
        for t in self.terms() {
            if !t.is_constant() && t.wire() >= nb_wires {
                return Err(SerializationError::InvalidData);
            }
        }
        Ok(())
    }
}

impl CompiledR1CS {
    /// Every term referenced by the system.
    fn terms(&self) -> impl Iterator<Item = &Term> {
        let constraints = self
            .constraints
            .iter()
            .flat_map(|r1c| r1c.l.iter().chain(r1c.r.iter()).chain(r1c.o.iter()));
        let hints = self
            .hints
            .iter()
            .flat_map(|h| h.inputs.iter().flat_map(|e| e.iter()));
        let entries = self
            .debug_info
            .iter()
            .chain(self.logs.iter())
            .flat_map(|e| e.items.iter())
            .flat_map(|item| match item {
                LogItem::Term(t) => std::slice::from_ref(t).iter(),
                LogItem::Eval(expr) => expr.terms.iter(),
            });
        constraints.chain(hints).chain(entries)
    }
}

impl CanonicalSerialize for CompiledR1CS {
    fn serialize_with_mode<W: Write>(
        &self,
        mut writer: W,
        compress: Compress,
    ) -> Result<(), SerializationError> {
        (self.nb_public_variables as u64).serialize_with_mode(&mut writer, compress)?;
        (self.nb_secret_variables as u64).serialize_with_mode(&mut writer, compress)?;
        (self.nb_internal_variables as u64).serialize_with_mode(&mut writer, compress)?;
        serialize_slice(&self.constraints, &mut writer, compress)?;
        serialize_slice(&self.hints, &mut writer, compress)?;
        serialize_slice(&self.debug_info, &mut writer, compress)?;
        serialize_slice(&self.logs, &mut writer, compress)
    }

    fn serialized_size(&self, compress: Compress) -> usize {
        3 * 8
            + slice_size(&self.constraints, compress)
            + slice_size(&self.hints, compress)
            + slice_size(&self.debug_info, compress)
            + slice_size(&self.logs, compress)
    }
}

impl CanonicalDeserialize for CompiledR1CS {
    fn deserialize_with_mode<R: Read>(
        mut reader: R,
        compress: Compress,
        validate: Validate,
    ) -> Result<Self, SerializationError> {
        let nb_public_variables = deserialize_wire(&mut reader, compress, validate)?;
        let nb_secret_variables = deserialize_wire(&mut reader, compress, validate)?;
        let nb_internal_variables = deserialize_wire(&mut reader, compress, validate)?;
        // bounded whatever `validate` says, like the array lengths
        checked_nb_wires(nb_public_variables, nb_secret_variables, nb_internal_variables)?;

        let cs = CompiledR1CS {
            nb_public_variables,
            nb_secret_variables,
            nb_internal_variables,
            constraints: deserialize_vec(&mut reader, compress, validate)?,
            hints: deserialize_vec(&mut reader, compress, validate)?,
            debug_info: deserialize_vec(&mut reader, compress, validate)?,
            logs: deserialize_vec(&mut reader, compress, validate)?,
        };
        // a duplicate hint binding is rejected whatever `validate` says: R1CS::new panics on it
        index_hints(&cs.hints).map_err(|_| SerializationError::InvalidData)?;
        if let Validate::Yes = validate {
            cs.check()?;
        }
        Ok(cs)
    }
}

struct Header {
    magic: [u8; 4],
    version: u8,
    curve: u8,
    fr_size: u32,
}

impl Header {
    fn new<F: CurveField>() -> Self {
        Header {
            magic: MAGIC,
            version: VERSION,
            curve: F::CURVE_ID.to_u8(),
            fr_size: F::byte_size() as u32,
        }
    }

    fn write<W: Write>(&self, mut writer: W) -> Result<(), SerializationError> {
        writer.write_all(&self.magic)?;
        self.version.serialize_compressed(&mut writer)?;
        self.curve.serialize_compressed(&mut writer)?;
        self.fr_size.serialize_compressed(&mut writer)
    }

    fn read<R: Read>(mut reader: R) -> Result<Self, SerializationError> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        Ok(Header {
            magic,
            version: u8::deserialize_compressed(&mut reader)?,
            curve: u8::deserialize_compressed(&mut reader)?,
            fr_size: u32::deserialize_compressed(&mut reader)?,
        })
    }

    fn validate<F: CurveField>(&self) -> Result<(), Error> {
        if self.magic != MAGIC {
            return Err(Error::BadMagic);
        }
        if self.version != VERSION {
            return Err(Error::UnsupportedVersion(self.version));
        }
        if self.curve != F::CURVE_ID.to_u8() || self.fr_size as usize != F::byte_size() {
            return Err(Error::CurveMismatch {
                expected: F::CURVE_ID,
                found: CurveId::from_u8(self.curve),
            });
        }
        Ok(())
    }
}

impl<F: CurveField> R1CS<F> {
    /// Checks that every coefficient reference has an entry in the table.
    fn check_coefficients(&self) -> Result<(), SerializationError> {
        let nb_coefficients = self.coefficients.len();
        let in_range =
            |id: CoeffId| id.index() < CoeffId::NUM_RESERVED || id.index() < nb_coefficients;
        if self.cs.terms().all(|t| in_range(t.coeff)) {
            Ok(())
        } else {
            Err(SerializationError::InvalidData)
        }
    }

    fn deserialize_body<R: Read>(
        mut reader: R,
        compress: Compress,
        validate: Validate,
    ) -> Result<Self, SerializationError> {
        let coefficients = CoeffTable::new(deserialize_vec(&mut reader, compress, validate)?);
        let cs = CompiledR1CS::deserialize_with_mode(&mut reader, compress, validate)?;
        let r1cs = R1CS::new(cs, coefficients);
        if let Validate::Yes = validate {
            r1cs.check_coefficients()?;
        }
        Ok(r1cs)
    }

    /// Encodes the system into `writer` and returns the number of bytes written.
    pub fn write_to<W: Write>(&self, writer: W) -> Result<u64, Error> {
        let mut writer = CountingWriter::new(writer);
        match self.serialize_compressed(&mut writer) {
            Ok(()) => Ok(writer.count),
            Err(source) => Err(Error::Serialize {
                bytes_written: writer.count,
                source,
            }),
        }
    }

    /// Decodes a system from `reader`, returning it with the number of bytes read.
    ///
    /// The logger output of the decoded system is [`Discard`](crate::debug::LogSink::Discard).
    pub fn read_from<R: Read>(reader: R) -> Result<(Self, u64), Error> {
        let mut reader = CountingReader::new(reader);

        let header = Header::read(&mut reader).map_err(|source| Error::Deserialize {
            bytes_read: reader.count,
            source,
        })?;
        header.validate::<F>()?;

        let r1cs = Self::deserialize_body(&mut reader, Compress::Yes, Validate::Yes).map_err(
            |source| Error::Deserialize {
                bytes_read: reader.count,
                source,
            },
        )?;
        tracing::debug!(
            bytes_read = reader.count,
            nb_constraints = r1cs.nb_constraints(),
            "decoded constraint system"
        );
        Ok((r1cs, reader.count))
    }
}

impl<F: CurveField> Valid for R1CS<F> {
    fn check(&self) -> Result<(), SerializationError> {
        self.cs.check()?;
        self.check_coefficients()
    }
}

impl<F: CurveField> CanonicalSerialize for R1CS<F> {
    fn serialize_with_mode<W: Write>(
        &self,
        mut writer: W,
        compress: Compress,
    ) -> Result<(), SerializationError> {
        Header::new::<F>().write(&mut writer)?;
        serialize_slice(self.coefficients.values(), &mut writer, compress)?;
        self.cs.serialize_with_mode(&mut writer, compress)
    }

    fn serialized_size(&self, compress: Compress) -> usize {
        HEADER_SIZE
            + slice_size(self.coefficients.values(), compress)
            + self.cs.serialized_size(compress)
    }
}

impl<F: CurveField> CanonicalDeserialize for R1CS<F> {
    fn deserialize_with_mode<R: Read>(
        mut reader: R,
        compress: Compress,
        validate: Validate,
    ) -> Result<Self, SerializationError> {
        let header = Header::read(&mut reader)?;
        header
            .validate::<F>()
            .map_err(|_| SerializationError::InvalidData)?;
        Self::deserialize_body(&mut reader, compress, validate)
    }
}

struct CountingWriter<W> {
    inner: W,
    count: u64,
}

impl<W> CountingWriter<W> {
    fn new(inner: W) -> Self {
        CountingWriter { inner, count: 0 }
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.count += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

struct CountingReader<R> {
    inner: R,
    count: u64,
}

impl<R> CountingReader<R> {
    fn new(inner: R) -> Self {
        CountingReader { inner, count: 0 }
    }
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.count += n as u64;
        Ok(n)
    }
}
