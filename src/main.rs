fn main() {
    resource_patch::main();
}
