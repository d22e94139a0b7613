use cuda_builder::CudaBuilder;

fn main() {
    CudaBuilder::new("../quicksort_gpu")
        .copy_to("../resources/quicksort_gpu.ptx")
        .build()
        .unwrap();
}
