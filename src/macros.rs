//! `delay!` (§7's PIT timer is the only clock source this kernel has): busy-waits by
//! polling the tick counter `interrupts::timer` already keeps, rather than pulling in a
//! separate sleep primitive. Ticks run at [`crate::config::TIMER_HZ`].

#[macro_export]
macro_rules! delay {
    ($millis:expr) => {{
        let ticks_per_ms = $crate::config::TIMER_HZ as u64 / 1000;
        let ticks_to_wait = core::cmp::max(1, $millis as u64 * ticks_per_ms);
        let target = $crate::interrupts::timer::get_ticks() + ticks_to_wait;
        while $crate::interrupts::timer::get_ticks() < target {
            core::hint::spin_loop();
        }
    }};
}
