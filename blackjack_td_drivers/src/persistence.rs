//! Binary Q-table files: an 8-byte magic, the number of dimensions (u16), each
//! dimension (u32), then every entry as an f64. All numbers are big-endian.

use crate::DriverError;
use blackjack_td::learning::table::{self, ActionValueTable};
use byteorder::{ReadBytesExt, WriteBytesExt, BE};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

const MAGIC: &[u8; 8] = b"BJTDQTAB";

pub fn write_q_table<W: Write>(q_table: &ActionValueTable, writer: &mut W) -> std::io::Result<()> {
    writer.write_all(MAGIC)?;
    writer.write_u16::<BE>(table::SHAPE.len() as u16)?;
    for dimension in table::SHAPE {
        writer.write_u32::<BE>(dimension as u32)?;
    }
    for value in q_table.as_slice() {
        writer.write_f64::<BE>(*value)?;
    }
    Ok(())
}

pub fn read_q_table<R: Read>(reader: &mut R) -> Result<ActionValueTable, DriverError> {
    let io_error = |source: std::io::Error| DriverError::Io {
        operation: "read",
        path: String::from("q-table"),
        source,
    };

    let mut magic = [0u8; 8];
    reader.read_exact(&mut magic).map_err(io_error)?;
    if &magic != MAGIC {
        return Err(DriverError::InvalidTableFile(String::from("bad magic")));
    }

    let number_of_dimensions = reader.read_u16::<BE>().map_err(io_error)? as usize;
    let mut shape = Vec::with_capacity(number_of_dimensions);
    for _ in 0..number_of_dimensions {
        shape.push(reader.read_u32::<BE>().map_err(io_error)? as usize);
    }
    if shape != table::SHAPE {
        return Err(DriverError::InvalidTableFile(format!(
            "shape {:?}, expected {:?}",
            shape,
            table::SHAPE
        )));
    }

    let mut values = Vec::with_capacity(table::LEN);
    for _ in 0..table::LEN {
        values.push(reader.read_f64::<BE>().map_err(io_error)?);
    }
    Ok(ActionValueTable::from_vec(values)?)
}

/// Writes the table to `path`, creating parent directories as needed.
pub fn save_q_table(q_table: &ActionValueTable, path: &Path) -> Result<(), DriverError> {
    let io_error = |operation: &'static str| {
        move |source: std::io::Error| DriverError::Io {
            operation,
            path: path.display().to_string(),
            source,
        }
    };
    log::info!("{:<32}{:<32}", "saving q-table", path.display());

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_error("create directory for"))?;
    }
    let file = File::create(path).map_err(io_error("create"))?;
    let mut writer = BufWriter::new(file);
    write_q_table(q_table, &mut writer).map_err(io_error("write"))?;
    writer.flush().map_err(io_error("write"))?;
    Ok(())
}

pub fn load_q_table(path: &Path) -> Result<ActionValueTable, DriverError> {
    log::info!("{:<32}{:<32}", "loading q-table", path.display());
    let file = File::open(path).map_err(|source| DriverError::Io {
        operation: "open",
        path: path.display().to_string(),
        source,
    })?;
    read_q_table(&mut BufReader::new(file))
}
