//! ACR122U device discovery and bulk I/O over rusb

use rusb::{Device, DeviceHandle, GlobalContext};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, trace};

use crate::channel::BulkChannel;
use crate::error::UsbError;

/// USB vendor ID of Advanced Card Systems
pub const ACR122U_VENDOR_ID: u16 = 0x072F;

/// USB product ID of the ACR122U
pub const ACR122U_PRODUCT_ID: u16 = 0x2200;

/// An opened and claimed ACR122U
///
/// The interface is released again when the device is dropped.
pub struct AcrUsbDevice {
    handle: DeviceHandle<GlobalContext>,
    interface_number: u8,
    endpoint_in: u8,
    endpoint_out: u8,
}

impl fmt::Debug for AcrUsbDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AcrUsbDevice")
            .field("interface_number", &self.interface_number)
            .field("endpoint_in", &format_args!("{:#04x}", self.endpoint_in))
            .field("endpoint_out", &format_args!("{:#04x}", self.endpoint_out))
            .finish()
    }
}

impl AcrUsbDevice {
    /// Open the first attached device with the given vendor and product ID
    ///
    /// Detaches an active kernel driver, activates the first configuration,
    /// and claims the first interface.
    pub fn open(vendor_id: u16, product_id: u16) -> Result<Self, UsbError> {
        let device = find_device(vendor_id, product_id)?
            .ok_or(UsbError::DeviceNotFound {
                vendor_id,
                product_id,
            })?;

        let handle = device.open()?;
        let config = device.config_descriptor(0)?;

        let interface = config
            .interfaces()
            .next()
            .and_then(|iface| iface.descriptors().next())
            .ok_or(UsbError::EndpointsNotFound)?;
        let interface_number = interface.interface_number();
        let (endpoint_in, endpoint_out) =
            find_bulk_endpoints(&interface).ok_or(UsbError::EndpointsNotFound)?;

        #[cfg(any(target_os = "linux", target_os = "macos"))]
        {
            if handle.kernel_driver_active(interface_number).unwrap_or(false) {
                debug!(interface_number, "Detaching kernel driver");
                handle.detach_kernel_driver(interface_number)?;
            }
        }

        // Already configured devices report Busy here, which is harmless
        if let Err(e) = handle.set_active_configuration(config.number()) {
            trace!(error = %e, "Could not set active configuration");
        }

        handle.claim_interface(interface_number)?;

        info!(
            bus = device.bus_number(),
            address = device.address(),
            "Opened ACR122U over USB"
        );

        Ok(Self {
            handle,
            interface_number,
            endpoint_in,
            endpoint_out,
        })
    }

    /// Check whether a device with the given IDs is attached, without opening it
    pub fn is_present(vendor_id: u16, product_id: u16) -> Result<bool, UsbError> {
        Ok(find_device(vendor_id, product_id)?.is_some())
    }
}

impl BulkChannel for AcrUsbDevice {
    fn write_bulk(&self, data: &[u8], timeout: Duration) -> Result<usize, UsbError> {
        match self.handle.write_bulk(self.endpoint_out, data, timeout) {
            Ok(n) => Ok(n),
            Err(rusb::Error::Timeout) => Err(UsbError::WriteTimeout),
            Err(e) => Err(UsbError::BulkTransfer(e)),
        }
    }

    fn read_bulk(&self, buf: &mut [u8], timeout: Duration) -> Result<usize, UsbError> {
        match self.handle.read_bulk(self.endpoint_in, buf, timeout) {
            Ok(n) => Ok(n),
            Err(rusb::Error::Timeout) => Err(UsbError::ReadTimeout),
            Err(e) => Err(UsbError::BulkTransfer(e)),
        }
    }
}

impl Drop for AcrUsbDevice {
    fn drop(&mut self) {
        // The device may already be gone, nothing to do about a failure here
        if let Err(e) = self.handle.release_interface(self.interface_number) {
            trace!(error = %e, "Failed to release USB interface");
        }
    }
}

fn find_device(vendor_id: u16, product_id: u16) -> Result<Option<Device<GlobalContext>>, UsbError> {
    for device in rusb::devices()?.iter() {
        let Ok(desc) = device.device_descriptor() else {
            continue;
        };
        if desc.vendor_id() == vendor_id && desc.product_id() == product_id {
            return Ok(Some(device));
        }
    }
    Ok(None)
}

/// Find the bulk IN/OUT endpoint addresses of an interface
fn find_bulk_endpoints(interface: &rusb::InterfaceDescriptor<'_>) -> Option<(u8, u8)> {
    let mut endpoint_in = None;
    let mut endpoint_out = None;

    for endpoint in interface.endpoint_descriptors() {
        if endpoint.transfer_type() == rusb::TransferType::Bulk {
            let address = endpoint.address();
            if endpoint.direction() == rusb::Direction::In {
                endpoint_in = Some(address);
            } else {
                endpoint_out = Some(address);
            }
        }
    }

    endpoint_in.zip(endpoint_out)
}
