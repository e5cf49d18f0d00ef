use core::fmt::{self, Write};
use spin::Once;

/// Character sink behind `print!`/`println!` and the logger.
///
/// The UART/SBI driver lives outside this crate; it registers itself once
/// during boot. Output written before that is dropped.
pub trait Console: Sync {
    fn put_char(&self, c: u8);

    #[inline]
    fn put_str(&self, s: &str) {
        for c in s.bytes() {
            self.put_char(c);
        }
    }
}

static CONSOLE: Once<&'static dyn Console> = Once::new();

pub fn init_console(console: &'static dyn Console) {
    CONSOLE.call_once(|| console);
}

pub fn print_str(s: &str) {
    if let Some(console) = CONSOLE.get() {
        console.put_str(s);
    }
}

#[macro_export]
macro_rules! print {
    ($($arg:tt)*) => {
        $crate::console::_print_fmt(format_args!($($arg)*));
    };
}

#[macro_export]
macro_rules! println {
    () => {
        $crate::console::print_str("\n");
    };
    ($($arg:tt)*) => {
        $crate::console::_print_fmt(format_args!($($arg)*));
        $crate::console::print_str("\n");
    };
}

pub fn _print_fmt(args: fmt::Arguments) {
    let mut writer = ConsoleWriter;
    if writer.write_fmt(args).is_err() {
        print_str("Error: ");
        print_str(args.as_str().unwrap_or("Unknown error"));
    }
}

struct ConsoleWriter;

impl Write for ConsoleWriter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        print_str(s);
        Ok(())
    }
}
