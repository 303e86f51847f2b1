//! Decoding of `_PRT` objects, which map PCI interrupt pins to interrupt
//! controller inputs.

use crate::{
    context::Symbol,
    interpreter::Interpreter,
    namespace::AmlName,
    object::Object,
    AmlError,
    Handler,
};
use alloc::vec::Vec;
use bit_field::BitField;
use core::convert::TryInto;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Pin {
    IntA,
    IntB,
    IntC,
    IntD,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum PciRouteType {
    /// The pin is hard-wired to a specific GSI.
    Gsi(u32),

    /// The pin is connected through a link device. The device will carry
    /// `_PRS` and `_CRS` objects and a `_SRS` method for configuring the
    /// routed interrupt; the resolved path of the device is stored so those
    /// children can be reached.
    LinkDevice(AmlName),
}

#[derive(Clone, Debug)]
pub struct PciRoute {
    device: u16,
    function: u16,
    pin: Pin,
    route_type: PciRouteType,
}

/// The decoded form of a `_PRT` package. One of these exists under each PCI
/// root bridge and consists of a package of 4-element packages, each
/// describing the routing of one device's interrupt pin.
#[derive(Clone, Debug)]
pub struct PciRoutingTable {
    entries: Vec<PciRoute>,
}

impl PciRoutingTable {
    /// Evaluates the `_PRT` object at `prt_path` and decodes its entries.
    ///
    /// Each inner package carries an address in `_ADR` format (device number
    /// in the high word, function number in the low word, where `0xffff`
    /// means every function of the device), a pin number, a source, and a
    /// source index. A source of integer zero routes the pin to the GSI named
    /// by the source index; a device source routes it through that link
    /// device. A source that is neither, or that names a non-device symbol,
    /// fails with [`AmlError::PrtInvalidSource`].
    pub fn from_prt_path<H: Handler>(
        prt_path: &AmlName,
        interpreter: &mut Interpreter<'_, H>,
    ) -> Result<PciRoutingTable, AmlError> {
        let prt = interpreter.interpret_method_call(prt_path, &[])?;
        let Object::Package(entries) = prt else {
            return Err(AmlError::InvalidConversion);
        };
        let entries = entries.lock().clone();

        let mut routes = Vec::with_capacity(entries.len());
        for entry in entries {
            let Object::Package(fields) = entry else {
                return Err(AmlError::PrtInvalidEntry);
            };
            let fields = fields.lock().clone();
            if fields.len() != 4 {
                return Err(AmlError::PrtInvalidEntry);
            }

            let address = fields[0].to_integer()?;
            let device =
                address.get_bits(16..32).try_into().map_err(|_| AmlError::PrtInvalidAddress)?;
            let function =
                address.get_bits(0..16).try_into().map_err(|_| AmlError::PrtInvalidAddress)?;
            let pin = match fields[1].to_integer()? {
                0 => Pin::IntA,
                1 => Pin::IntB,
                2 => Pin::IntC,
                3 => Pin::IntD,
                _ => return Err(AmlError::PrtInvalidPin),
            };

            let route_type = match &fields[2] {
                Object::Integer(0) => {
                    /*
                     * The source index holds the GSI number the pin is
                     * connected to.
                     */
                    let gsi = fields[3]
                        .to_integer()?
                        .try_into()
                        .map_err(|_| AmlError::PrtInvalidGsi)?;
                    PciRouteType::Gsi(gsi)
                }
                Object::Device(path) => PciRouteType::LinkDevice(path.clone()),
                Object::String(name) => {
                    /*
                     * The generator emitted the source as a string rather
                     * than a name path; resolve it relative to the table's
                     * own scope.
                     */
                    let scope = prt_path.parent()?;
                    let (resolved, symbol) =
                        interpreter.context.lookup_in(&AmlName::from_str(name)?, &scope)?;
                    let Symbol::Device(_) = symbol else {
                        return Err(AmlError::PrtInvalidSource);
                    };
                    PciRouteType::LinkDevice(resolved)
                }
                _ => return Err(AmlError::PrtInvalidSource),
            };

            routes.push(PciRoute { device, function, pin, route_type });
        }

        Ok(PciRoutingTable { entries: routes })
    }

    /// Looks up the route for a given device, function and pin. An entry
    /// whose function number is `0xffff` matches every function of its
    /// device. Returns [`AmlError::PrtNoEntry`] when no entry matches.
    pub fn route(&self, device: u16, function: u16, pin: Pin) -> Result<&PciRouteType, AmlError> {
        self.entries
            .iter()
            .find(|entry| {
                entry.device == device
                    && (entry.function == 0xffff || entry.function == function)
                    && entry.pin == pin
            })
            .map(|entry| &entry.route_type)
            .ok_or(AmlError::PrtNoEntry)
    }

    pub fn entries(&self) -> &[PciRoute] {
        &self.entries
    }
}

impl PciRoute {
    pub fn route_type(&self) -> &PciRouteType {
        &self.route_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        context::Context,
        parser::parse_table,
        test_utils::{make_test_table, TestHandler},
    };

    fn prt_table() -> Vec<u8> {
        // Device(LNKA) {}
        let mut body = alloc::vec![0x5b, 0x82, 0x05, b'L', b'N', b'K', b'A'];
        // Name(_PRT, Package {
        //     Package { 0xffff, 0, LNKA, 0 },
        //     Package { 0x001f0000, 1, 0, 11 },
        // })
        body.extend_from_slice(&[0x08, b'_', b'P', b'R', b'T']);
        body.extend_from_slice(&[0x12, 0x1a, 0x02]);
        body.extend_from_slice(&[
            0x12, 0x0b, 0x04,
            0x0b, 0xff, 0xff,
            0x00,
            b'L', b'N', b'K', b'A',
            0x00,
        ]);
        body.extend_from_slice(&[
            0x12, 0x0b, 0x04,
            0x0c, 0x00, 0x00, 0x1f, 0x00,
            0x01,
            0x00,
            0x0a, 0x0b,
        ]);
        make_test_table(&body)
    }

    #[test]
    fn test_prt_with_link_device_and_gsi_entries() {
        let table = prt_table();
        let mut context = Context::new();
        parse_table(&mut context, &table).unwrap();

        let mut interpreter = Interpreter::new(&mut context, TestHandler::new());
        let prt = AmlName::from_str("\\_PRT").unwrap();
        let routing = PciRoutingTable::from_prt_path(&prt, &mut interpreter).unwrap();

        // Function 0xffff matches any function of device 0.
        let link = AmlName::from_str("\\LNKA").unwrap();
        assert_eq!(routing.route(0, 0, Pin::IntA), Ok(&PciRouteType::LinkDevice(link.clone())));
        assert_eq!(routing.route(0, 3, Pin::IntA), Ok(&PciRouteType::LinkDevice(link)));

        assert_eq!(routing.route(0x1f, 0, Pin::IntB), Ok(&PciRouteType::Gsi(11)));

        assert_eq!(routing.route(0x1f, 1, Pin::IntB), Err(AmlError::PrtNoEntry));
        assert_eq!(routing.route(0, 0, Pin::IntD), Err(AmlError::PrtNoEntry));
    }

    #[test]
    fn test_prt_entry_must_have_four_fields() {
        // Name(_PRT, Package { Package { Zero } })
        let body = [
            0x08, b'_', b'P', b'R', b'T',
            0x12, 0x06, 0x01,
            0x12, 0x03, 0x01, 0x00,
        ];
        let table = make_test_table(&body);
        let mut context = Context::new();
        parse_table(&mut context, &table).unwrap();

        let mut interpreter = Interpreter::new(&mut context, TestHandler::new());
        let prt = AmlName::from_str("\\_PRT").unwrap();
        assert!(matches!(
            PciRoutingTable::from_prt_path(&prt, &mut interpreter),
            Err(AmlError::PrtInvalidEntry)
        ));
    }
}
