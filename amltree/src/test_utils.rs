use crate::Handler;
use alloc::{collections::BTreeMap, vec::Vec};

/// Wraps a term list in a valid `DSDT` definition block header, with the
/// length and checksum fields filled in.
pub(crate) fn make_test_table(body: &[u8]) -> Vec<u8> {
    let length = (36 + body.len()) as u32;

    let mut table = Vec::with_capacity(length as usize);
    table.extend_from_slice(b"DSDT");
    table.extend_from_slice(&length.to_le_bytes());
    table.push(2);
    table.push(0);
    table.extend_from_slice(b"AMLTST");
    table.extend_from_slice(b"TESTTABL");
    table.extend_from_slice(&1u32.to_le_bytes());
    table.extend_from_slice(b"TREE");
    table.extend_from_slice(&1u32.to_le_bytes());
    table.extend_from_slice(body);

    let sum = table.iter().fold(0u8, |sum, &byte| sum.wrapping_add(byte));
    table[9] = sum.wrapping_neg();
    table
}

/// A handler backed by sparse maps, so tests can preload region contents and
/// inspect what the interpreter wrote.
#[derive(Default)]
pub(crate) struct TestHandler {
    pub memory: BTreeMap<u64, u8>,
    pub io: BTreeMap<u16, u8>,
    pub pci: BTreeMap<(u16, u8, u8, u8, u16), u8>,
}

impl TestHandler {
    pub fn new() -> TestHandler {
        TestHandler::default()
    }

    fn read_mem(&self, address: u64, bytes: usize) -> u64 {
        (0..bytes).fold(0, |value, i| {
            value | (*self.memory.get(&(address + i as u64)).unwrap_or(&0) as u64) << (i * 8)
        })
    }

    fn write_mem(&mut self, address: u64, value: u64, bytes: usize) {
        for i in 0..bytes {
            self.memory.insert(address + i as u64, (value >> (i * 8)) as u8);
        }
    }

    fn read_io(&self, port: u16, bytes: usize) -> u32 {
        (0..bytes).fold(0, |value, i| {
            value | (*self.io.get(&(port + i as u16)).unwrap_or(&0) as u32) << (i * 8)
        })
    }

    fn write_io(&mut self, port: u16, value: u32, bytes: usize) {
        for i in 0..bytes {
            self.io.insert(port + i as u16, (value >> (i * 8)) as u8);
        }
    }
}

impl Handler for TestHandler {
    fn read_u8(&self, address: usize) -> u8 {
        self.read_mem(address as u64, 1) as u8
    }
    fn read_u16(&self, address: usize) -> u16 {
        self.read_mem(address as u64, 2) as u16
    }
    fn read_u32(&self, address: usize) -> u32 {
        self.read_mem(address as u64, 4) as u32
    }
    fn read_u64(&self, address: usize) -> u64 {
        self.read_mem(address as u64, 8)
    }

    fn write_u8(&mut self, address: usize, value: u8) {
        self.write_mem(address as u64, value as u64, 1)
    }
    fn write_u16(&mut self, address: usize, value: u16) {
        self.write_mem(address as u64, value as u64, 2)
    }
    fn write_u32(&mut self, address: usize, value: u32) {
        self.write_mem(address as u64, value as u64, 4)
    }
    fn write_u64(&mut self, address: usize, value: u64) {
        self.write_mem(address as u64, value, 8)
    }

    fn read_io_u8(&self, port: u16) -> u8 {
        self.read_io(port, 1) as u8
    }
    fn read_io_u16(&self, port: u16) -> u16 {
        self.read_io(port, 2) as u16
    }
    fn read_io_u32(&self, port: u16) -> u32 {
        self.read_io(port, 4)
    }

    fn write_io_u8(&mut self, port: u16, value: u8) {
        self.write_io(port, value as u32, 1)
    }
    fn write_io_u16(&mut self, port: u16, value: u16) {
        self.write_io(port, value as u32, 2)
    }
    fn write_io_u32(&mut self, port: u16, value: u32) {
        self.write_io(port, value, 4)
    }

    fn read_pci_u8(&self, segment: u16, bus: u8, device: u8, function: u8, offset: u16) -> u8 {
        *self.pci.get(&(segment, bus, device, function, offset)).unwrap_or(&0)
    }
    fn read_pci_u16(&self, segment: u16, bus: u8, device: u8, function: u8, offset: u16) -> u16 {
        (0..2).fold(0, |value, i| {
            value
                | (self.read_pci_u8(segment, bus, device, function, offset + i) as u16)
                    << (i * 8)
        })
    }
    fn read_pci_u32(&self, segment: u16, bus: u8, device: u8, function: u8, offset: u16) -> u32 {
        (0..4).fold(0, |value, i| {
            value
                | (self.read_pci_u8(segment, bus, device, function, offset + i) as u32)
                    << (i * 8)
        })
    }

    fn write_pci_u8(
        &mut self,
        segment: u16,
        bus: u8,
        device: u8,
        function: u8,
        offset: u16,
        value: u8,
    ) {
        self.pci.insert((segment, bus, device, function, offset), value);
    }
    fn write_pci_u16(
        &mut self,
        segment: u16,
        bus: u8,
        device: u8,
        function: u8,
        offset: u16,
        value: u16,
    ) {
        for i in 0..2 {
            self.write_pci_u8(segment, bus, device, function, offset + i, (value >> (i * 8)) as u8);
        }
    }
    fn write_pci_u32(
        &mut self,
        segment: u16,
        bus: u8,
        device: u8,
        function: u8,
        offset: u16,
        value: u32,
    ) {
        for i in 0..4 {
            self.write_pci_u8(segment, bus, device, function, offset + i, (value >> (i * 8)) as u8);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_checksum() {
        let table = make_test_table(&[0xa3, 0x10]);
        assert_eq!(table.len(), 38);
        assert_eq!(&table[0..4], b"DSDT");
        assert_eq!(table.iter().fold(0u8, |sum, &byte| sum.wrapping_add(byte)), 0);
    }
}
