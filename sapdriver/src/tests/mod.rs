mod acquisition_tests;
