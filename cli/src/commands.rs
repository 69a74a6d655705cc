use parking_lot::Mutex;
use std::io::{self, Write};
use tracing::debug;

use keyring::{
    KeyringConfig, KeyringError, MemKeyring, OpenFile, TeardownReport, KEYRING_IOCTL_ADD,
    KEYRING_IOCTL_DEL,
};
use syscalls::{Syscalls, NR_DEQUEUE, NR_ENQUEUE, NR_POP, NR_PUSH};

const FAILURE: i32 = -1;

/// Everything the commands talk to: the keyring module and the syscall table
pub struct Kernel {
    keyring: MemKeyring,
    syscalls: Mutex<Syscalls>,
}

impl Kernel {
    /// # Errors
    /// `InvalidArgument` if the keyring configuration does not validate.
    pub fn load(config: KeyringConfig) -> Result<Self, KeyringError> {
        Ok(Self {
            keyring: MemKeyring::in_memory(config)?,
            syscalls: Mutex::new(Syscalls::new()),
        })
    }

    #[must_use]
    pub fn keyring(&self) -> &MemKeyring {
        &self.keyring
    }

    /// Raw system call: value, `0`, or `-1` on failure
    pub fn syscall(&self, nr: i64, arg: Option<i64>) -> i64 {
        self.syscalls.lock().syscall(nr, arg)
    }

    pub fn unload(self) -> TeardownReport {
        self.keyring.exit()
    }
}

/// C `atoi`: optional whitespace and sign, then the leading digits.
///
/// Anything unparsable yields 0. Out-of-range values saturate.
#[must_use]
pub fn atoi(s: &str) -> i32 {
    let s = s.trim_start_matches(|c: char| c.is_ascii_whitespace());
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let magnitude = digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0i64, |acc, b| {
            acc.saturating_mul(10).saturating_add(i64::from(b - b'0'))
        });
    let value = if negative { -magnitude } else { magnitude };
    i32::try_from(value).unwrap_or(if negative { i32::MIN } else { i32::MAX })
}

/// Run the command named by `argv[0]`.
///
/// # Errors
/// Only failures writing to `out`.
pub fn run(kernel: &Kernel, argv: &[&str], out: &mut impl Write) -> io::Result<i32> {
    let Some(program) = argv.first() else {
        return Ok(0);
    };
    debug!(program, args = argv.len() - 1, "running command");
    match *program {
        "keyadd" => keyring_ioctl(kernel, argv, KEYRING_IOCTL_ADD, out),
        "keydel" => keyring_ioctl(kernel, argv, KEYRING_IOCTL_DEL, out),
        "keyshow" => keyshow(kernel, out),
        "keywrite" => keywrite(kernel, argv, out),
        "keyread" => keyread(kernel, argv, out),
        "push-into-stack" => push_into_stack(kernel, argv, out),
        "pop-from-stack" => pop_from_stack(kernel, out),
        "enqueue" => enqueue(kernel, argv, out),
        "dequeue" => dequeue(kernel, argv, out),
        other => {
            writeln!(out, "{other}: command not found")?;
            Ok(FAILURE)
        }
    }
}

fn open_control(kernel: &Kernel, out: &mut impl Write) -> io::Result<Option<OpenFile>> {
    match kernel.keyring().open_control() {
        Ok(file) => Ok(Some(file)),
        Err(e) => {
            debug!(error = %e, "open of controller failed");
            writeln!(out, "Failed to open device.")?;
            Ok(None)
        }
    }
}

fn open_slot(kernel: &Kernel, num: i32, out: &mut impl Write) -> io::Result<Option<OpenFile>> {
    let key = u32::from_ne_bytes(num.to_ne_bytes());
    match kernel.keyring().open_slot(key) {
        Ok(file) => Ok(Some(file)),
        Err(e) => {
            debug!(key, error = %e, "open of slot device failed");
            writeln!(out, "Failed to open device.")?;
            Ok(None)
        }
    }
}

/// `keyadd [number]` and `keydel [number]`
pub fn keyring_ioctl(
    kernel: &Kernel,
    argv: &[&str],
    cmd: u32,
    out: &mut impl Write,
) -> io::Result<i32> {
    let [program, number] = argv else {
        writeln!(out, "Usage : {} [number]", argv.first().unwrap_or(&"keyadd"))?;
        return Ok(FAILURE);
    };
    let num = atoi(number);
    if num == 0 {
        writeln!(out, "Error : Invalid value entered.")?;
        return Ok(FAILURE);
    }
    let Some(ctl) = open_control(kernel, out)? else {
        return Ok(FAILURE);
    };
    if ctl.ioctl_raw(cmd, Some(&num.to_ne_bytes())) < 0 {
        debug!(program, num, "ioctl failed");
        writeln!(out, "Failed to do ioctl command.")?;
        return Ok(FAILURE);
    }
    Ok(0)
}

/// `keyshow`: list the registry; the controller logs the same report
pub fn keyshow(kernel: &Kernel, out: &mut impl Write) -> io::Result<i32> {
    if open_control(kernel, out)?.is_none() {
        return Ok(FAILURE);
    }
    for slot in kernel.keyring().control().show() {
        writeln!(out, "keyring{} : {}", slot.key, slot.text())?;
    }
    Ok(0)
}

/// `keywrite [number] [offset] [text]`
pub fn keywrite(kernel: &Kernel, argv: &[&str], out: &mut impl Write) -> io::Result<i32> {
    let [program, number, offset, text @ ..] = argv else {
        writeln!(out, "Usage : keywrite [number] [offset] [text]")?;
        return Ok(FAILURE);
    };
    if text.is_empty() {
        writeln!(out, "Usage : {program} [number] [offset] [text]")?;
        return Ok(FAILURE);
    }
    let num = atoi(number);
    let Ok(mut offset) = u64::try_from(atoi(offset)) else {
        writeln!(out, "Error : Invalid value entered.")?;
        return Ok(FAILURE);
    };
    if num == 0 {
        writeln!(out, "Error : Invalid value entered.")?;
        return Ok(FAILURE);
    }
    let Some(file) = open_slot(kernel, num, out)? else {
        return Ok(FAILURE);
    };
    let text = text.join(" ");
    let written = file.write_raw(text.as_bytes(), &mut offset);
    if written < 0 {
        writeln!(out, "Failed to write device.")?;
        return Ok(FAILURE);
    }
    writeln!(out, "Write : {written} bytes")?;
    Ok(0)
}

/// `keyread [number] [offset] [length]`
pub fn keyread(kernel: &Kernel, argv: &[&str], out: &mut impl Write) -> io::Result<i32> {
    let [program, number, offset, length] = argv else {
        writeln!(out, "Usage : keyread [number] [offset] [length]")?;
        return Ok(FAILURE);
    };
    let num = atoi(number);
    let (Ok(mut offset), Ok(length)) = (u64::try_from(atoi(offset)), usize::try_from(atoi(length)))
    else {
        writeln!(out, "Error : Invalid value entered.")?;
        return Ok(FAILURE);
    };
    if num == 0 {
        writeln!(out, "Error : Invalid value entered.")?;
        return Ok(FAILURE);
    }
    let Some(file) = open_slot(kernel, num, out)? else {
        return Ok(FAILURE);
    };
    let mut buf = vec![0u8; read_window(kernel, length)];
    let Ok(n) = usize::try_from(file.read_raw(&mut buf, &mut offset)) else {
        debug!(program, num, "read failed");
        writeln!(out, "Failed to read device.")?;
        return Ok(FAILURE);
    };
    let data = &buf[..n];
    let end = data.iter().position(|b| *b == 0).unwrap_or(n);
    writeln!(out, "Read : {}", String::from_utf8_lossy(&data[..end]))?;
    Ok(0)
}

// A slot never returns more than one buffer
fn read_window(kernel: &Kernel, length: usize) -> usize {
    length.min(kernel.keyring().config().buf_size)
}

/// `push-into-stack [value]`
pub fn push_into_stack(kernel: &Kernel, argv: &[&str], out: &mut impl Write) -> io::Result<i32> {
    let [_, value] = argv else {
        writeln!(out, "Usage: {} [value]", argv.first().unwrap_or(&"push-into-stack"))?;
        return Ok(FAILURE);
    };
    let val = i64::from(atoi(value));
    if val == 0 {
        writeln!(out, "Invalid value entered.")?;
        return Ok(FAILURE);
    }
    if kernel.syscall(NR_PUSH, Some(val)) == -1 {
        writeln!(out, "Failed to push into stack.")?;
        return Ok(FAILURE);
    }
    writeln!(out, "push [{val}] into stack.")?;
    Ok(0)
}

/// `pop-from-stack`; extra arguments are ignored
pub fn pop_from_stack(kernel: &Kernel, out: &mut impl Write) -> io::Result<i32> {
    let ret = kernel.syscall(NR_POP, None);
    if ret == -1 {
        writeln!(out, "Failed to pop from stack.")?;
        return Ok(FAILURE);
    }
    writeln!(out, "pop [{ret}] from stack.")?;
    Ok(0)
}

/// `enqueue [value]`
pub fn enqueue(kernel: &Kernel, argv: &[&str], out: &mut impl Write) -> io::Result<i32> {
    let [_, value] = argv else {
        writeln!(out, "Usage : {} [value]", argv.first().unwrap_or(&"enqueue"))?;
        return Ok(FAILURE);
    };
    let val = i64::from(atoi(value));
    if val == 0 {
        writeln!(out, "Invalid value entered.")?;
        return Ok(FAILURE);
    }
    if kernel.syscall(NR_ENQUEUE, Some(val)) == -1 {
        writeln!(out, "Failed to enqueue.")?;
        return Ok(FAILURE);
    }
    writeln!(out, "Enqueue : {val}")?;
    Ok(0)
}

/// `dequeue`
pub fn dequeue(kernel: &Kernel, argv: &[&str], out: &mut impl Write) -> io::Result<i32> {
    let [_] = argv else {
        writeln!(out, "Usage : {}", argv.first().unwrap_or(&"dequeue"))?;
        return Ok(FAILURE);
    };
    let ret = kernel.syscall(NR_DEQUEUE, None);
    if ret == -1 {
        writeln!(out, "Failed to dequeue.")?;
        return Ok(FAILURE);
    }
    writeln!(out, "Dequeue : {ret}")?;
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_window_is_bounded_by_buffer() {
        let kernel = Kernel::load(KeyringConfig::default()).unwrap();
        assert_eq!(read_window(&kernel, 5), 5);
        assert_eq!(read_window(&kernel, 2_000_000_000), 32);
    }

    #[test]
    fn test_atoi() {
        assert_eq!(atoi("42"), 42);
        assert_eq!(atoi("  -7xyz"), -7);
        assert_eq!(atoi("+3"), 3);
        assert_eq!(atoi("abc"), 0);
        assert_eq!(atoi(""), 0);
        assert_eq!(atoi("-"), 0);
        assert_eq!(atoi("99999999999"), i32::MAX);
        assert_eq!(atoi("-99999999999"), i32::MIN);
    }
}
