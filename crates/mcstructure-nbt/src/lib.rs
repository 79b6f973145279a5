use byteorder::{ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};

mod compound;
pub mod value;

pub use compound::Compound;
pub use value::Value;

pub const TAG_END: u8 = 0;
pub const TAG_BYTE: u8 = 1;
pub const TAG_SHORT: u8 = 2;
pub const TAG_INT: u8 = 3;
pub const TAG_LONG: u8 = 4;
pub const TAG_FLOAT: u8 = 5;
pub const TAG_DOUBLE: u8 = 6;
pub const TAG_BYTE_ARRAY: u8 = 7;
pub const TAG_STRING: u8 = 8;
pub const TAG_LIST: u8 = 9;
pub const TAG_COMPOUND: u8 = 10;
pub const TAG_INT_ARRAY: u8 = 11;
pub const TAG_LONG_ARRAY: u8 = 12;

/// Nesting depth past which a stream is rejected instead of recursed into.
const MAX_DEPTH: usize = 512;

// Upper bound for up-front allocations driven by untrusted length prefixes.
const MAX_PREALLOC: usize = 4096;

#[derive(Debug, Clone, PartialEq)]
pub enum Tag {
    End,
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<i8>),
    String(String),
    /// Element type id followed by the items. The id is kept so that empty
    /// lists are written back with the type they were read with.
    List(u8, Vec<Tag>),
    Compound(Compound),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
}

fn invalid_data(msg: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.into())
}

fn invalid_input(msg: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, msg.into())
}

fn read_len<B: ByteOrder, R: Read>(reader: &mut R) -> io::Result<usize> {
    let length = reader.read_i32::<B>()?;
    usize::try_from(length).map_err(|_| invalid_data(format!("Negative length: {}", length)))
}

fn write_len<B: ByteOrder, W: Write>(writer: &mut W, length: usize) -> io::Result<()> {
    let length = i32::try_from(length)
        .map_err(|_| invalid_input(format!("Length {} does not fit in an i32", length)))?;
    writer.write_i32::<B>(length)
}

fn read_string<B: ByteOrder, R: Read>(reader: &mut R) -> io::Result<String> {
    let length = reader.read_u16::<B>()?;
    let mut bytes = vec![0u8; length as usize];
    reader.read_exact(&mut bytes)?;
    String::from_utf8(bytes).map_err(|e| invalid_data(e.to_string()))
}

fn write_string<B: ByteOrder, W: Write>(writer: &mut W, value: &str) -> io::Result<()> {
    let length = u16::try_from(value.len())
        .map_err(|_| invalid_input(format!("String of {} bytes is too long", value.len())))?;
    writer.write_u16::<B>(length)?;
    writer.write_all(value.as_bytes())
}

/// Writes the named children of a compound followed by its End terminator.
fn write_entries<B: ByteOrder, W: Write>(writer: &mut W, compound: &Compound) -> io::Result<()> {
    for (name, tag) in compound.iter() {
        if let Tag::End = tag {
            return Err(invalid_input(format!("Compound entry `{}` is an end tag", name)));
        }
        tag.write::<B, W>(writer, name)?;
    }
    writer.write_u8(TAG_END)
}

impl Tag {
    pub fn get_type_id(&self) -> u8 {
        match self {
            Tag::End => TAG_END,
            Tag::Byte(_) => TAG_BYTE,
            Tag::Short(_) => TAG_SHORT,
            Tag::Int(_) => TAG_INT,
            Tag::Long(_) => TAG_LONG,
            Tag::Float(_) => TAG_FLOAT,
            Tag::Double(_) => TAG_DOUBLE,
            Tag::ByteArray(_) => TAG_BYTE_ARRAY,
            Tag::String(_) => TAG_STRING,
            Tag::List(..) => TAG_LIST,
            Tag::Compound(_) => TAG_COMPOUND,
            Tag::IntArray(_) => TAG_INT_ARRAY,
            Tag::LongArray(_) => TAG_LONG_ARRAY,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Tag::End => "end",
            Tag::Byte(_) => "byte",
            Tag::Short(_) => "short",
            Tag::Int(_) => "int",
            Tag::Long(_) => "long",
            Tag::Float(_) => "float",
            Tag::Double(_) => "double",
            Tag::ByteArray(_) => "byte array",
            Tag::String(_) => "string",
            Tag::List(..) => "list",
            Tag::Compound(_) => "compound",
            Tag::IntArray(_) => "int array",
            Tag::LongArray(_) => "long array",
        }
    }

    /// A list whose element type is taken from its first item. Empty lists
    /// get the End element type.
    pub fn list(items: Vec<Tag>) -> Tag {
        let element_type = items.first().map_or(TAG_END, Tag::get_type_id);
        Tag::List(element_type, items)
    }

    pub fn list_of(element_type: u8, items: Vec<Tag>) -> Tag {
        Tag::List(element_type, items)
    }

    pub fn int_list<I: IntoIterator<Item = i32>>(values: I) -> Tag {
        Tag::List(TAG_INT, values.into_iter().map(Tag::Int).collect())
    }

    pub fn read<B: ByteOrder, R: Read>(reader: &mut R) -> io::Result<(String, Tag)> {
        Tag::read_named::<B, R>(reader, 0)
    }

    fn read_named<B: ByteOrder, R: Read>(reader: &mut R, depth: usize) -> io::Result<(String, Tag)> {
        let type_id = reader.read_u8()?;
        if type_id == TAG_END {
            return Ok((String::new(), Tag::End));
        }

        let name = read_string::<B, R>(reader)?;
        let tag = Tag::read_payload::<B, R>(reader, type_id, depth)?;
        Ok((name, tag))
    }

    fn read_payload<B: ByteOrder, R: Read>(
        reader: &mut R,
        type_id: u8,
        depth: usize,
    ) -> io::Result<Tag> {
        if depth > MAX_DEPTH {
            return Err(invalid_data("Tag nesting is too deep"));
        }

        match type_id {
            TAG_END => Ok(Tag::End),
            TAG_BYTE => Ok(Tag::Byte(reader.read_i8()?)),
            TAG_SHORT => Ok(Tag::Short(reader.read_i16::<B>()?)),
            TAG_INT => Ok(Tag::Int(reader.read_i32::<B>()?)),
            TAG_LONG => Ok(Tag::Long(reader.read_i64::<B>()?)),
            TAG_FLOAT => Ok(Tag::Float(reader.read_f32::<B>()?)),
            TAG_DOUBLE => Ok(Tag::Double(reader.read_f64::<B>()?)),
            TAG_BYTE_ARRAY => {
                let length = read_len::<B, R>(reader)?;
                let mut bytes = Vec::with_capacity(length.min(MAX_PREALLOC));
                for _ in 0..length {
                    bytes.push(reader.read_i8()?);
                }
                Ok(Tag::ByteArray(bytes))
            }
            TAG_STRING => Ok(Tag::String(read_string::<B, R>(reader)?)),
            TAG_LIST => {
                let element_type = reader.read_u8()?;
                let length = read_len::<B, R>(reader)?;
                if element_type == TAG_END && length > 0 {
                    return Err(invalid_data("List of end tags must be empty"));
                }
                let mut list = Vec::with_capacity(length.min(MAX_PREALLOC));
                for _ in 0..length {
                    list.push(Tag::read_payload::<B, R>(reader, element_type, depth + 1)?);
                }
                Ok(Tag::List(element_type, list))
            }
            TAG_COMPOUND => {
                let mut compound = Compound::new();
                loop {
                    let (name, tag) = Tag::read_named::<B, R>(reader, depth + 1)?;
                    if let Tag::End = tag {
                        break;
                    }
                    compound.insert(name, tag);
                }
                Ok(Tag::Compound(compound))
            }
            TAG_INT_ARRAY => {
                let length = read_len::<B, R>(reader)?;
                let mut ints = Vec::with_capacity(length.min(MAX_PREALLOC));
                for _ in 0..length {
                    ints.push(reader.read_i32::<B>()?);
                }
                Ok(Tag::IntArray(ints))
            }
            TAG_LONG_ARRAY => {
                let length = read_len::<B, R>(reader)?;
                let mut longs = Vec::with_capacity(length.min(MAX_PREALLOC));
                for _ in 0..length {
                    longs.push(reader.read_i64::<B>()?);
                }
                Ok(Tag::LongArray(longs))
            }
            _ => Err(invalid_data(format!("Invalid tag type: {}", type_id))),
        }
    }

    pub fn write<B: ByteOrder, W: Write>(&self, writer: &mut W, name: &str) -> io::Result<()> {
        writer.write_u8(self.get_type_id())?;

        if !matches!(self, Tag::End) {
            write_string::<B, W>(writer, name)?;
        }

        self.write_payload::<B, W>(writer)
    }

    fn write_payload<B: ByteOrder, W: Write>(&self, writer: &mut W) -> io::Result<()> {
        match self {
            Tag::End => Ok(()),
            Tag::Byte(v) => writer.write_i8(*v),
            Tag::Short(v) => writer.write_i16::<B>(*v),
            Tag::Int(v) => writer.write_i32::<B>(*v),
            Tag::Long(v) => writer.write_i64::<B>(*v),
            Tag::Float(v) => writer.write_f32::<B>(*v),
            Tag::Double(v) => writer.write_f64::<B>(*v),
            Tag::ByteArray(v) => {
                write_len::<B, W>(writer, v.len())?;
                for &b in v {
                    writer.write_i8(b)?;
                }
                Ok(())
            }
            Tag::String(v) => write_string::<B, W>(writer, v),
            Tag::List(element_type, items) => {
                if let Some(stray) = items.iter().find(|tag| tag.get_type_id() != *element_type) {
                    return Err(invalid_input(format!(
                        "List of type {} contains a {} tag",
                        element_type,
                        stray.type_name()
                    )));
                }
                if *element_type == TAG_END && !items.is_empty() {
                    return Err(invalid_input("List of end tags must be empty"));
                }
                writer.write_u8(*element_type)?;
                write_len::<B, W>(writer, items.len())?;
                for tag in items {
                    tag.write_payload::<B, W>(writer)?;
                }
                Ok(())
            }
            Tag::Compound(v) => write_entries::<B, W>(writer, v),
            Tag::IntArray(v) => {
                write_len::<B, W>(writer, v.len())?;
                for &i in v {
                    writer.write_i32::<B>(i)?;
                }
                Ok(())
            }
            Tag::LongArray(v) => {
                write_len::<B, W>(writer, v.len())?;
                for &l in v {
                    writer.write_i64::<B>(l)?;
                }
                Ok(())
            }
        }
    }

    pub fn as_compound(&self) -> Option<&Compound> {
        match self {
            Tag::Compound(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&Vec<Tag>> {
        match self {
            Tag::List(_, list) => Some(list),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&String> {
        match self {
            Tag::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Tag::Long(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Tag::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_i16(&self) -> Option<i16> {
        match self {
            Tag::Short(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_i8(&self) -> Option<i8> {
        match self {
            Tag::Byte(n) => Some(*n),
            _ => None,
        }
    }
}

/// A complete tag tree: a named root compound.
#[derive(Debug, Clone, PartialEq)]
pub struct NbtFile {
    pub root: Compound,
    pub name: String,
}

impl NbtFile {
    pub fn new(name: String, root: Compound) -> Self {
        NbtFile { root, name }
    }

    pub fn read<B: ByteOrder, R: Read>(reader: &mut R) -> io::Result<Self> {
        match Tag::read::<B, R>(reader)? {
            (name, Tag::Compound(root)) => Ok(NbtFile { root, name }),
            (_, other) => Err(invalid_data(format!(
                "Root tag must be a compound, found {}",
                other.type_name()
            ))),
        }
    }

    pub fn write<B: ByteOrder, W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_u8(TAG_COMPOUND)?;
        write_string::<B, W>(writer, &self.name)?;
        write_entries::<B, W>(writer, &self.root)
    }

    pub fn read_le<R: Read>(reader: &mut R) -> io::Result<Self> {
        Self::read::<LittleEndian, R>(reader)
    }

    pub fn write_le<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        self.write::<LittleEndian, W>(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use byteorder::BigEndian;
    use std::io::Cursor;

    #[test]
    fn test_tag_type_ids() {
        assert_eq!(Tag::End.get_type_id(), 0);
        assert_eq!(Tag::Byte(0).get_type_id(), 1);
        assert_eq!(Tag::Short(0).get_type_id(), 2);
        assert_eq!(Tag::Int(0).get_type_id(), 3);
        assert_eq!(Tag::Long(0).get_type_id(), 4);
        assert_eq!(Tag::Float(0.0).get_type_id(), 5);
        assert_eq!(Tag::Double(0.0).get_type_id(), 6);
        assert_eq!(Tag::ByteArray(vec![]).get_type_id(), 7);
        assert_eq!(Tag::String("".to_string()).get_type_id(), 8);
        assert_eq!(Tag::list(vec![]).get_type_id(), 9);
        assert_eq!(Tag::Compound(Compound::new()).get_type_id(), 10);
        assert_eq!(Tag::IntArray(vec![]).get_type_id(), 11);
        assert_eq!(Tag::LongArray(vec![]).get_type_id(), 12);
    }

    #[test]
    fn test_int_is_little_endian() {
        let mut buffer = Vec::new();
        Tag::Int(0x0102_0304).write::<LittleEndian, _>(&mut buffer, "v").unwrap();
        // id, name length (2 bytes), name, payload
        assert_eq!(buffer, vec![3, 1, 0, b'v', 4, 3, 2, 1]);
    }

    #[test]
    fn test_tag_read_write() {
        let test_cases = vec![
            (Tag::Byte(42), "byte"),
            (Tag::Short(1234), "short"),
            (Tag::Int(12345678), "int"),
            (Tag::Long(123456789012), "long"),
            (Tag::Float(3.5), "float"),
            (Tag::Double(3.14159), "double"),
            (Tag::ByteArray(vec![1, 2, 3]), "bytearray"),
            (Tag::String("Hello, World!".to_string()), "string"),
            (Tag::int_list([1, 2, 3]), "list"),
            (Tag::IntArray(vec![1, 2, 3]), "intarray"),
            (Tag::LongArray(vec![1, 2, 3]), "longarray"),
        ];

        for (tag, name) in test_cases {
            let mut buffer = Vec::new();
            tag.write::<LittleEndian, _>(&mut buffer, name).unwrap();

            let mut cursor = Cursor::new(buffer);
            let (read_name, read_tag) = Tag::read::<LittleEndian, _>(&mut cursor).unwrap();

            assert_eq!(read_name, name);
            assert_eq!(read_tag, tag);
        }
    }

    #[test]
    fn test_compound_order_is_preserved() {
        let compound = Compound::new()
            .with("zeta", Tag::Byte(1))
            .with("alpha", Tag::String("test".to_string()))
            .with("list", Tag::int_list([1, 2]));
        let tag = Tag::Compound(compound);

        let mut first = Vec::new();
        tag.write::<LittleEndian, _>(&mut first, "root").unwrap();

        let (name, read_tag) = Tag::read::<LittleEndian, _>(&mut Cursor::new(&first)).unwrap();
        assert_eq!(name, "root");
        assert_eq!(read_tag, tag);

        let keys: Vec<&str> = read_tag.as_compound().unwrap().iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "list"]);

        let mut second = Vec::new();
        read_tag.write::<LittleEndian, _>(&mut second, "root").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_nbt_file() {
        let root = Compound::new()
            .with("name", Tag::String("Test".to_string()))
            .with("value", Tag::Int(42));
        let original = NbtFile::new("test".to_string(), root);

        let mut buffer = Vec::new();
        original.write_le(&mut buffer).unwrap();
        let read = NbtFile::read_le(&mut Cursor::new(buffer)).unwrap();
        assert_eq!(read, original);

        let mut big = Vec::new();
        original.write::<BigEndian, _>(&mut big).unwrap();
        let read = NbtFile::read::<BigEndian, _>(&mut Cursor::new(big)).unwrap();
        assert_eq!(read, original);
    }

    #[test]
    fn test_root_must_be_compound() {
        let mut buffer = Vec::new();
        Tag::Int(7).write::<LittleEndian, _>(&mut buffer, "").unwrap();

        let err = NbtFile::read_le(&mut Cursor::new(buffer)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_truncated_stream() {
        let root = Compound::new().with("value", Tag::Int(42));
        let mut buffer = Vec::new();
        NbtFile::new(String::new(), root).write_le(&mut buffer).unwrap();
        buffer.truncate(buffer.len() - 3);

        let err = NbtFile::read_le(&mut Cursor::new(buffer)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_invalid_tag_type() {
        let buffer = vec![255u8];
        let result = Tag::read_payload::<LittleEndian, _>(&mut Cursor::new(buffer), 255, 0);
        assert_matches!(result, Err(e) if e.kind() == io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_negative_length() {
        let mut buffer = vec![TAG_INT_ARRAY, 0, 0];
        buffer.extend_from_slice(&(-1i32).to_le_bytes());
        let err = Tag::read::<LittleEndian, _>(&mut Cursor::new(buffer)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_empty_list_keeps_element_type() {
        let tag = Tag::list_of(TAG_COMPOUND, vec![]);
        let mut buffer = Vec::new();
        tag.write::<LittleEndian, _>(&mut buffer, "empty").unwrap();

        let (name, read_tag) = Tag::read::<LittleEndian, _>(&mut Cursor::new(buffer)).unwrap();
        assert_eq!(name, "empty");
        assert_eq!(read_tag, Tag::List(TAG_COMPOUND, vec![]));
    }

    #[test]
    fn test_mixed_list_is_rejected() {
        let tag = Tag::list_of(TAG_INT, vec![Tag::Int(1), Tag::Byte(2)]);
        let err = tag.write::<LittleEndian, _>(&mut Vec::new(), "mixed").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_end_tag_value_is_rejected() {
        let nested = Tag::Compound(Compound::new().with("Pos", Tag::End));
        let err = nested.write::<LittleEndian, _>(&mut Vec::new(), "entity").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);

        let file = NbtFile::new(String::new(), Compound::new().with("broken", Tag::End));
        let err = file.write_le(&mut Vec::new()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);

        let ends = Tag::list_of(TAG_END, vec![Tag::End]);
        let err = ends.write::<LittleEndian, _>(&mut Vec::new(), "ends").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
