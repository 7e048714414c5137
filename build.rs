fn main() {
    // Only flash builds need the ESP-IDF environment; host tests build
    // without the `espidf` feature and must not touch embuild.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
