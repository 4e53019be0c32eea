fn main() {
    // Only firmware builds need the ESP-IDF environment exported; host
    // builds (tests, simulation) skip it entirely.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
